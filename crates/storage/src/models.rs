//! Upload models.

use std::collections::HashMap;

/// Descriptive metadata attached to every uploaded object.
///
/// Built fresh per file by the intake pipeline and never mutated after
/// construction. The fixed key set is part of the upload contract; the
/// analysis side queries objects by these keys.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UploadMetadata {
    /// Filename exactly as the technician's device wrote it.
    pub user_input_filename: String,
    /// Which machine performed the upload.
    pub upload_device_id: String,
    /// Random token shared by every file of one batch run. Distinguishes
    /// two uploads of identically named trees on the same day.
    pub upload_session: String,
    /// The plant/container identifier the file was stamped with.
    pub identifier: String,
    /// RFC 3339 creation timestamp of the file on the device.
    pub file_created: String,
    /// Comma-joined identifiers decoded from the image itself, when any.
    pub raw_identifiers: Option<String>,
}

impl UploadMetadata {
    /// Flatten into the string map the object store expects.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::from([
            ("user_input_filename".to_string(), self.user_input_filename.clone()),
            ("upload_device_id".to_string(), self.upload_device_id.clone()),
            ("upload_session".to_string(), self.upload_session.clone()),
            ("identifier".to_string(), self.identifier.clone()),
            ("file_created".to_string(), self.file_created.clone()),
        ]);
        if let Some(raw) = &self.raw_identifiers {
            map.insert("raw_identifiers".to_string(), raw.clone());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UploadMetadata {
        UploadMetadata {
            user_input_filename: "leaf.jpg".to_string(),
            upload_device_id: "greenhouse-3".to_string(),
            upload_session: "4f9zd13a42".to_string(),
            identifier: "cylinder42".to_string(),
            file_created: "2024-05-17T09:30:00+02:00".to_string(),
            raw_identifiers: None,
        }
    }

    #[test]
    fn test_map_has_fixed_keys() {
        let map = sample().to_map();
        assert_eq!(map.len(), 5);
        assert_eq!(map["user_input_filename"], "leaf.jpg");
        assert_eq!(map["identifier"], "cylinder42");
        assert!(!map.contains_key("raw_identifiers"));
    }

    #[test]
    fn test_raw_identifiers_included_when_present() {
        let mut metadata = sample();
        metadata.raw_identifiers = Some("cylinder42,cylinder43".to_string());
        let map = metadata.to_map();
        assert_eq!(map["raw_identifiers"], "cylinder42,cylinder43");
    }
}
