/// Controls whether metadata-only changes trigger snapshot events.
///
/// Forwarded to the native listener as `includeMetadataChanges`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataChanges {
    /// Listen to changes in metadata as well as data.
    Include,

    /// Do not listen to metadata-only changes.
    ///
    /// This is the default behavior.
    #[default]
    Exclude,
}

impl MetadataChanges {
    /// Wire flag for the native listener
    pub fn include(&self) -> bool {
        matches!(self, MetadataChanges::Include)
    }
}
