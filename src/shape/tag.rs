/// Column name that excludes a field from conversion.
pub const SKIP_MARKER: &str = "-";

const REQUIRED: &str = "required";
const OMIT_EMPTY: &str = "omitempty";

/// One `key[=value]` option following the column name in a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOption {
    key: String,
    value: Option<String>,
}

impl TagOption {
    fn parse(token: &str) -> Self {
        match token.split_once('=') {
            Some((key, value)) => Self {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => Self {
                key: token.to_string(),
                value: None,
            },
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// The parsed form of a field tag: `name[,required][,omitempty]`.
///
/// Parsing never fails. Unknown options are kept but have no effect, and an
/// empty name is accepted as is.
///
/// # Examples
///
/// ```
/// use tagged_csv::shape::TagMetadata;
///
/// let tag = TagMetadata::parse("email,required,omitempty");
/// assert_eq!(tag.name(), "email");
/// assert!(tag.required());
/// assert!(tag.omit_empty());
///
/// assert!(TagMetadata::parse("-").is_skipped());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMetadata {
    name: String,
    required: bool,
    omit_empty: bool,
    options: Vec<TagOption>,
}

impl TagMetadata {
    /// Metadata for a column with no options set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            omit_empty: false,
            options: Vec::new(),
        }
    }

    pub fn parse(tag: &str) -> Self {
        let mut tokens = tag.split(',');
        let name = tokens.next().unwrap_or_default();
        let options: Vec<TagOption> = tokens.map(TagOption::parse).collect();
        let has = |key: &str| options.iter().any(|option| option.key == key);

        Self {
            name: name.to_string(),
            required: has(REQUIRED),
            omit_empty: has(OMIT_EMPTY),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// An empty cell is an error instead of the zero value.
    pub fn required(&self) -> bool {
        self.required
    }

    /// A zero value is written as an empty cell.
    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// The field takes no part in encoding or decoding.
    pub fn is_skipped(&self) -> bool {
        self.name == SKIP_MARKER
    }

    pub fn option(&self, key: &str) -> Option<&TagOption> {
        self.options.iter().find(|option| option.key == key)
    }

    pub fn options(&self) -> &[TagOption] {
        &self.options
    }
}
