use snafu::Snafu;

const UNIT_STEP: u64 = 1024;
const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Formats a byte count with binary unit prefixes up to pebibytes (2^50)
pub fn to_human_size(bytes: u64) -> Result<String, SizeFormatError> {
    if bytes < UNIT_STEP {
        return Ok(format!("{bytes} B"));
    }

    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= UNIT_STEP {
        scaled /= UNIT_STEP;
        exponent += 1;
    }

    let unit = UNITS
        .get(exponent)
        .ok_or(SizeFormatError::TooLarge { bytes })?;
    let value = bytes as f64 / (UNIT_STEP as f64).powi(exponent as i32);
    Ok(format!("{value:.1} {unit}"))
}

pub trait ByteSizeExt {
    fn to_human_size(&self) -> Result<String, SizeFormatError>;
}

impl ByteSizeExt for u64 {
    fn to_human_size(&self) -> Result<String, SizeFormatError> {
        to_human_size(*self)
    }
}

#[derive(Debug, Snafu)]
pub enum SizeFormatError {
    #[snafu(display("{} bytes exceed the largest supported unit (PiB)", bytes))]
    TooLarge { bytes: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(0, "0 B")]
    #[case(1023, "1023 B")]
    #[case(1024, "1.0 KiB")]
    #[case(1536, "1.5 KiB")]
    #[case(5 * 1024 * 1024, "5.0 MiB")]
    #[case(3 << 30, "3.0 GiB")]
    #[case(1 << 40, "1.0 TiB")]
    #[case(1 << 50, "1.0 PiB")]
    fn formats_with_binary_prefixes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(bytes.to_human_size().unwrap(), expected);
    }

    #[test]
    fn largest_pebibyte_value_is_supported() {
        let bytes = (1u64 << 60) - 1;

        let formatted = bytes.to_human_size().unwrap();

        assert!(formatted.ends_with(" PiB"), "got {formatted}");
    }

    #[rstest]
    #[case(1 << 60)]
    #[case(u64::MAX)]
    fn magnitudes_beyond_pebibytes_fail(#[case] bytes: u64) {
        let result = bytes.to_human_size();

        assert!(matches!(result, Err(SizeFormatError::TooLarge { bytes: b }) if b == bytes));
    }
}
