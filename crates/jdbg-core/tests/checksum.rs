//! Checksum verification over whole blobs

mod common;

use common::{field, BlobBuilder};
use jdbg_core::format::header::{compute_checksum, CHECKSUM_OFFSET};
use jdbg_core::format::FormatReport;
use jdbg_core::{ChecksumStatus, DebugInfo, JdbgError, ResolveOptions};

fn sample() -> Vec<u8>
{
    BlobBuilder::new()
        .module_name("Project1")
        .unit(0x1000, "Unit1")
        .source(0x1000, "Unit1.pas")
        .line(0x1000, 10)
        .line(0x1008, 11)
        .symbol(0x1000, "TForm1", "Create")
        .build()
}

#[test]
fn test_sealed_blob_verifies()
{
    let data = sample();
    let report = FormatReport::inspect(&data);
    assert_eq!(report.checksum, ChecksumStatus::Valid);

    let stored = report.header.unwrap().stored_checksum();
    assert_eq!(compute_checksum(&data, stored), stored);
}

#[test]
fn test_every_single_byte_flip_is_detected()
{
    let data = sample();
    let checksum_field = CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4;

    for index in (0..data.len()).filter(|i| !checksum_field.contains(i)) {
        let mut corrupted = data.clone();
        corrupted[index] ^= 0x80;
        let info = DebugInfo::new(corrupted);

        assert!(!info.is_valid(), "flip at byte {index} went unnoticed");
        if index >= 5 {
            // Past signature and version the structure still parses, so
            // only the checksum can catch it.
            assert!(
                matches!(info.checksum(), ChecksumStatus::Mismatch { .. }),
                "byte {index}: {:?}",
                info.checksum()
            );
        }
    }
}

#[test]
fn test_clearing_the_validity_byte_is_detected()
{
    let mut data = sample();
    data[field::CHECK_SUM_VALID] ^= 0x01;

    let info = DebugInfo::new(data.clone());
    assert_eq!(info.checksum(), ChecksumStatus::NotPresent);
    assert!(info.valid_format());
    assert!(!info.is_valid());

    let strict = DebugInfo::with_options(data, ResolveOptions::strict());
    assert_eq!(strict.resolve(0x1000u32), Err(JdbgError::ChecksumNotRecorded));
}

#[test]
fn test_checksum_not_checked_without_flag()
{
    let mut data = BlobBuilder::new().unit(0, "Main").without_checksum().build();
    // Any stored value is ignored while the flag is clear.
    data[CHECKSUM_OFFSET] ^= 0xFF;
    let info = DebugInfo::new(data.clone());
    assert_eq!(info.checksum(), ChecksumStatus::NotPresent);
    assert!(!info.is_valid());
    assert_eq!(info.module_name(0u32).unwrap(), "Main");

    data[field::CHECK_SUM_VALID] = 1;
    let info = DebugInfo::new(data);
    assert!(matches!(info.checksum(), ChecksumStatus::Mismatch { .. }));
}
