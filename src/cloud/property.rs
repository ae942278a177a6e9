//! Application context and the property payload.
//!
//! The device exposes two properties: `Data`, a short string, and `Status`,
//! a flag. They are posted together as
//! `{"Data": "<data>", "Status": <0|1>}`.

use super::error::Error;
use core::fmt::Write as _;
use heapless::String;
use serde::Deserialize;

/// Identifier of the data property.
pub const PROPERTY_ID_DATA: &str = "Data";

/// Identifier of the status property.
pub const PROPERTY_ID_STATUS: &str = "Status";

/// Value the data property starts with.
pub const DEFAULT_PROP_DATA: &str = "Hello,World!";

/// Longest data property value.
pub const MAX_PROP_DATA_LEN: usize = 29;

/// Capacity of a rendered property payload.
pub const PAYLOAD_CAPACITY: usize = 60;

/// A rendered property payload.
pub type PropertyPayload = String<PAYLOAD_CAPACITY>;

/// State shared by the loop and every callback.
///
/// Passed explicitly by `&mut` to whoever needs it; there is no global copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    /// Device id handed out by the session driver.
    pub device_id: i32,
    /// Current value of the data property.
    pub prop_data: String<MAX_PROP_DATA_LEN>,
    /// Current value of the status property.
    pub prop_status: bool,
    /// Whether the session is currently connected.
    pub cloud_connected: bool,
    /// Whether the device finished its initial subscriptions.
    pub device_initialized: bool,
}

impl Default for AppContext {
    fn default() -> Self {
        let mut prop_data = String::new();
        // DEFAULT_PROP_DATA is shorter than MAX_PROP_DATA_LEN.
        let _ = prop_data.push_str(DEFAULT_PROP_DATA);
        Self {
            device_id: 0,
            prop_data,
            prop_status: true,
            cloud_connected: false,
            device_initialized: false,
        }
    }
}

impl AppContext {
    /// Creates a context holding the default property values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the data property.
    ///
    /// # Errors
    ///
    /// * [`Error::BufferOverflow`] - longer than [`MAX_PROP_DATA_LEN`] bytes
    /// * [`Error::FormatError`] - contains a quote, backslash or control
    ///   character that would break the payload
    pub fn set_prop_data(&mut self, data: &str) -> Result<(), Error> {
        self.prop_data = validate_prop_data(data)?;
        Ok(())
    }

    /// Render the current properties as a post payload.
    pub fn render_payload(&self) -> Result<PropertyPayload, Error> {
        render_property_payload(&self.prop_data, self.prop_status)
    }

    /// Apply a property-set request from the cloud.
    ///
    /// Either field may be missing. `Status` is accepted as `0`/`1` or as a
    /// JSON boolean. Nothing changes unless the whole request is valid.
    ///
    /// # Errors
    ///
    /// * [`Error::FormatError`] - malformed JSON, an out-of-range status, or
    ///   a data value that is too long or contains characters that would
    ///   break the payload
    pub fn apply_property_set(&mut self, request: &str) -> Result<(), Error> {
        let (data, status) = parse_property_set(request)?;
        let data = data
            .map(validate_prop_data)
            .transpose()
            .map_err(|_| Error::FormatError)?;

        if let Some(data) = data {
            self.prop_data = data;
        }
        if let Some(status) = status {
            self.prop_status = status;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct PropertySet<'a, S> {
    #[serde(rename = "Data", borrow, default)]
    data: Option<&'a str>,
    #[serde(rename = "Status", default)]
    status: Option<S>,
}

/// Numeric status first, then boolean; the JSON parser has no untyped mode.
fn parse_property_set(request: &str) -> Result<(Option<&str>, Option<bool>), Error> {
    if let Ok((set, _)) = serde_json_core::from_str::<PropertySet<'_, u8>>(request) {
        let status = match set.status {
            None => None,
            Some(0) => Some(false),
            Some(1) => Some(true),
            Some(_) => return Err(Error::FormatError),
        };
        return Ok((set.data, status));
    }

    let (set, _) = serde_json_core::from_str::<PropertySet<'_, bool>>(request)
        .map_err(|_| Error::FormatError)?;
    Ok((set.data, set.status))
}

fn validate_prop_data(data: &str) -> Result<String<MAX_PROP_DATA_LEN>, Error> {
    let breaks_payload = |c: char| c == '"' || c == '\\' || c.is_control();
    if data.chars().any(breaks_payload) {
        return Err(Error::FormatError);
    }
    String::try_from(data).map_err(|_| Error::BufferOverflow)
}

/// Render `{"Data": "<data>", "Status": <0|1>}`.
///
/// # Examples
///
/// ```rust
/// use sensorlink::cloud::property::render_property_payload;
///
/// let payload = render_property_payload("Hello,World!", true).unwrap();
/// assert_eq!(payload.as_str(), r#"{"Data": "Hello,World!", "Status": 1}"#);
/// ```
pub fn render_property_payload(data: &str, status: bool) -> Result<PropertyPayload, Error> {
    let mut payload = PropertyPayload::new();
    write!(
        payload,
        "{{\"{}\": \"{}\", \"{}\": {}}}",
        PROPERTY_ID_DATA, data, PROPERTY_ID_STATUS, u8::from(status)
    )
    .map_err(|_| Error::BufferOverflow)?;
    Ok(payload)
}
