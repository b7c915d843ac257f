//! Well-formed values for each step of the event wizard.

use event_wizard_core::{fields, FileAsset, FormValues};

/// Presigned upload URL handed out by the recording API
pub const UPLOAD_URL: &str =
    "https://bucket.example.com/events/poster.png?X-Amz-Signature=abc123&X-Amz-Expires=60";

/// Public URL of [`UPLOAD_URL`] once the query is stripped
pub const ASSET_URL: &str = "https://bucket.example.com/events/poster.png";

/// Minimal PNG payload
pub fn png_asset() -> FileAsset {
    FileAsset::new(
        "poster.png",
        "image/png",
        vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
    )
}

/// Step 0: name, address, postal code, city
pub fn general_info() -> FormValues {
    FormValues::new()
        .with(fields::NAME, "Concert")
        .with(fields::ADDRESS, "1 Rue X")
        .with(fields::ZIP_CODE, "75001")
        .with(fields::CITY, "Paris")
}

/// Step 1: start date only
pub fn dates() -> FormValues {
    FormValues::new().with(fields::STARTING_DATE, "2024-06-01")
}

/// Step 2: the poster
pub fn image_step() -> FormValues {
    FormValues::new().with(fields::IMAGE, png_asset())
}

/// Step 3: a free event
pub fn price() -> FormValues {
    FormValues::new().with(fields::PRICE, "0")
}

/// Step 4: description without a website
pub fn description() -> FormValues {
    FormValues::new().with(fields::DESCRIPTION, "Free show")
}

/// Values for every step, in order
pub fn concert_steps() -> Vec<FormValues> {
    vec![general_info(), dates(), image_step(), price(), description()]
}

/// Union of every step's values
pub fn concert_values() -> FormValues {
    concert_steps()
        .into_iter()
        .fold(FormValues::new(), |mut acc, step| {
            acc.merge(step);
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concert_values_cover_every_step() {
        let values = concert_values();
        assert_eq!(values.text(fields::CITY), Some("Paris"));
        assert_eq!(values.text(fields::PRICE), Some("0"));
        assert!(values.get(fields::IMAGE).and_then(|v| v.as_file()).is_some());
        assert!(!values.contains(fields::WEBSITE));
    }
}
