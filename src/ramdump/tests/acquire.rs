//! End-to-end acquisition through the public API.
//!
//! A regular file stands in for `/dev/mem` (file offset == physical address)
//! and a temp file holds a `/proc/iomem` listing.

use ramdump::{
    AcquireConfig, AcquireError, AcquisitionSession, GapPolicy, IomemRegistry, PhysicalMemory,
};
use std::io::{self, Write};
use std::path::Path;
use tempfile::TempDir;

const DEVICE_SIZE: usize = 0x10000;

fn device_byte(offset: usize) -> u8 {
    (offset * 7 + (offset >> 12)) as u8
}

struct Fixture {
    dir: TempDir,
    device: Vec<u8>,
}

impl Fixture {
    fn new(iomem: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let device: Vec<u8> = (0..DEVICE_SIZE).map(device_byte).collect();

        std::fs::write(dir.path().join("mem"), &device).unwrap();
        let mut file = std::fs::File::create(dir.path().join("iomem")).unwrap();
        file.write_all(iomem.as_bytes()).unwrap();

        Fixture { dir, device }
    }

    fn output(&self) -> std::path::PathBuf {
        self.dir.path().join("ram.raw")
    }

    fn config(&self) -> AcquireConfig {
        AcquireConfig::new(self.output())
            .with_chunk_size(4096)
            .with_device(self.dir.path().join("mem"))
            .with_registry(self.dir.path().join("iomem"))
    }

    fn bytes(&self, start: usize, end_inclusive: usize) -> &[u8] {
        &self.device[start..=end_inclusive]
    }
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

#[test]
fn test_single_range_two_chunks() {
    let fixture = Fixture::new("00000000-00000fff : Reserved\n00001000-00002fff : System RAM\n");

    let report = AcquisitionSession::new(fixture.config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.windows, 2);
    assert_eq!(report.chunks_written, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(file_len(&fixture.output()), 8192);
    assert_eq!(
        std::fs::read(fixture.output()).unwrap(),
        fixture.bytes(0x1000, 0x2fff)
    );
}

#[test]
fn test_ranges_concatenated_in_registry_order() {
    let fixture = Fixture::new(
        "\
00008000-00008fff : System RAM
00009000-00009fff : Reserved
00001000-000017ff : System RAM
  00001000-000010ff : Kernel code
0000a000-0000ffff : PCI Bus 0000:00
  0000c000-0000cfff : System RAM
",
    );

    let report = AcquisitionSession::new(fixture.config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.ranges, 3);
    let mut expected = fixture.bytes(0x8000, 0x8fff).to_vec();
    expected.extend_from_slice(fixture.bytes(0x1000, 0x17ff));
    expected.extend_from_slice(fixture.bytes(0xc000, 0xcfff));
    assert_eq!(std::fs::read(fixture.output()).unwrap(), expected);
}

#[test]
fn test_no_system_ram_creates_empty_output() {
    let fixture = Fixture::new("00000000-00000fff : Reserved\n000f0000-000fffff : System ROM\n");

    let report = AcquisitionSession::new(fixture.config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.bytes_written, 0);
    assert!(fixture.output().exists());
    assert_eq!(file_len(&fixture.output()), 0);
}

#[test]
fn test_rerun_truncates_previous_dump() {
    let fixture = Fixture::new("00001000-00004fff : System RAM\n");
    AcquisitionSession::new(fixture.config())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(file_len(&fixture.output()), 0x4000);

    std::fs::write(
        fixture.dir.path().join("iomem"),
        "00002000-00002fff : System RAM\n",
    )
    .unwrap();
    AcquisitionSession::new(fixture.config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        std::fs::read(fixture.output()).unwrap(),
        fixture.bytes(0x2000, 0x2fff)
    );
}

#[test]
fn test_missing_device_is_setup_failure() {
    let fixture = Fixture::new("00001000-00002fff : System RAM\n");
    let config = fixture.config().with_device(fixture.dir.path().join("nope"));

    let err = AcquisitionSession::new(config).err().unwrap();
    assert!(matches!(err, AcquireError::Device { .. }));
    assert!(!fixture.output().exists());
}

#[test]
fn test_unwritable_output_reports_open_code() {
    let fixture = Fixture::new("00001000-00002fff : System RAM\n");
    let mut config = fixture.config();
    config.output = fixture.dir.path().join("no-such-dir").join("ram.raw");

    let err = AcquisitionSession::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, AcquireError::Open { .. }));
    assert_eq!(err.code(), libc::ENOENT);
}

/// Physical memory that refuses one window and serves a fill byte elsewhere
struct HoleyMemory {
    hole: u64,
}

impl PhysicalMemory for HoleyMemory {
    type Window<'a> = Vec<u8>;

    fn map(&self, start: u64, len: usize) -> io::Result<Vec<u8>> {
        if start == self.hole {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "hole"));
        }
        Ok(vec![0x5A; len])
    }
}

#[test]
fn test_unmappable_window_skipped_or_zero_filled() {
    let fixture = Fixture::new("00001000-00002fff : System RAM\n");

    for (policy, expected_len) in [(GapPolicy::Skip, 4096), (GapPolicy::ZeroFill, 8192)] {
        let memory = HoleyMemory { hole: 0x2000 };
        let session = AcquisitionSession::with_parts(
            fixture.config().with_gap_policy(policy),
            IomemRegistry::new(fixture.dir.path().join("iomem")),
            memory,
        )
        .unwrap();

        let report = session.run().unwrap();
        assert_eq!(report.windows, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].start, 0x2000);
        assert_eq!(file_len(&fixture.output()), expected_len);
    }
}
