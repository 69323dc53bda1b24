use url::Url;

use crate::codec::ShareToken;
use crate::constants::share::{DATA_PARAM, FRAGMENT_PAIR_DELIMITER, MODE_PARAM, TRAINEE_MODE};
use crate::errors::TransferError;

/// Share-related parts of the location the viewer was opened with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundLink {
    /// Compressed token from `#data=<token>`, kept exactly as it appears.
    pub fragment_token: Option<String>,
    /// Legacy `?data=` payload after URL form-decoding.
    pub legacy_payload: Option<String>,
    /// `?mode=trainee` was present.
    pub trainee_mode: bool,
}

impl InboundLink {
    /// Parse an absolute location such as `https://host/?mode=trainee#data=N4Ig...`.
    pub fn parse(location: &str) -> Result<Self, TransferError> {
        let url = Url::parse(location).map_err(|err| {
            TransferError::Configuration(format!("invalid location '{location}': {err}"))
        })?;
        Ok(Self::from_url(&url))
    }

    /// Extract share parameters from an already-parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let fragment_token = url.fragment().and_then(fragment_data);
        let mut legacy_payload = None;
        let mut trainee_mode = false;
        for (key, value) in url.query_pairs() {
            if key == DATA_PARAM && legacy_payload.is_none() && !value.is_empty() {
                legacy_payload = Some(value.into_owned());
            } else if key == MODE_PARAM && value == TRAINEE_MODE {
                trainee_mode = true;
            }
        }
        Self {
            fragment_token,
            legacy_payload,
            trainee_mode,
        }
    }

    /// True when the location carries shared data on either path.
    pub fn has_shared_data(&self) -> bool {
        self.fragment_token.is_some() || self.legacy_payload.is_some()
    }
}

fn fragment_data(fragment: &str) -> Option<String> {
    fragment
        .split(FRAGMENT_PAIR_DELIMITER)
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| *key == DATA_PARAM && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Build the read-only link handed to trainees: `<origin>/?mode=trainee#data=<token>`.
pub fn share_url(origin: &Url, token: &ShareToken) -> String {
    format!(
        "{}/?{MODE_PARAM}={TRAINEE_MODE}#{DATA_PARAM}={}",
        origin.origin().ascii_serialization(),
        token.as_str()
    )
}
