//! Top-level discovery (`TLDISCOVER`) request payload.

use serde::Serialize;

use crate::error::ValidationError;

/// Discovery level used when none is given.
pub const DEFAULT_DISCOVERY_LEVEL: i32 = 1;

/// Kind of discovery run. Only top-level discovery exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestType {
    #[serde(rename = "TLDISCOVER")]
    TlDiscover,
}

/// Body of `POST schemas/tldiscover`.
///
/// Only constructible through [`DiscoveryRequest::new`], which guarantees
/// numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    discovery_level: i32,
    gateway_ids: Vec<i64>,
    request_type: RequestType,
    schema_id: i64,
}

impl DiscoveryRequest {
    /// Discovery of scope `scope_id` through the collectors `gateway_ids`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyField`] if `gateway_ids` is empty
    /// - [`ValidationError::InvalidIds`] listing every non-numeric gateway id,
    ///   or naming `scope_id` if the scope id is not numeric
    pub fn new<S: AsRef<str>>(scope_id: &str, gateway_ids: &[S]) -> Result<Self, ValidationError> {
        let gateway_ids = parse_gateway_ids(gateway_ids)?;
        let schema_id = scope_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidIds {
                field: "scope_id",
                invalid: vec![scope_id.to_owned()],
            })?;

        Ok(Self {
            discovery_level: DEFAULT_DISCOVERY_LEVEL,
            gateway_ids,
            request_type: RequestType::TlDiscover,
            schema_id,
        })
    }

    #[must_use]
    pub fn with_discovery_level(mut self, level: i32) -> Self {
        self.discovery_level = level;
        self
    }

    #[must_use]
    pub fn discovery_level(&self) -> i32 {
        self.discovery_level
    }

    #[must_use]
    pub fn gateway_ids(&self) -> &[i64] {
        &self.gateway_ids
    }

    #[must_use]
    pub fn schema_id(&self) -> i64 {
        self.schema_id
    }
}

/// Parse collector ids into the numeric gateway ids discovery expects.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyField`] for an empty slice and
/// [`ValidationError::InvalidIds`] listing every entry that is not an
/// integer.
pub fn parse_gateway_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<i64>, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::EmptyField("gateway_ids"));
    }

    let mut parsed = Vec::with_capacity(ids.len());
    let mut invalid = Vec::new();
    for id in ids {
        let id = id.as_ref();
        match id.trim().parse::<i64>() {
            Ok(n) => parsed.push(n),
            Err(_) => invalid.push(id.to_owned()),
        }
    }

    if invalid.is_empty() {
        Ok(parsed)
    } else {
        Err(ValidationError::InvalidIds {
            field: "gateway_ids",
            invalid,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_wire_format() {
        let req = DiscoveryRequest::new("12", &["1417", "1418"]).unwrap();
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "discoveryLevel": 1,
                "gatewayIds": [1417, 1418],
                "requestType": "TLDISCOVER",
                "schemaId": 12
            })
        );
    }

    #[test]
    fn collects_every_invalid_gateway_id() {
        let err = parse_gateway_ids(&["1", "abc", "2", "x9"]).unwrap_err();
        match err {
            ValidationError::InvalidIds { field, invalid } => {
                assert_eq!(field, "gateway_ids");
                assert_eq!(invalid, vec!["abc", "x9"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_gateway_list_rejected() {
        let ids: [&str; 0] = [];
        assert!(matches!(
            parse_gateway_ids(&ids),
            Err(ValidationError::EmptyField("gateway_ids"))
        ));
    }

    #[test]
    fn non_numeric_scope_id_rejected() {
        let err = DiscoveryRequest::new("scope-abc", &["1"]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidIds { field: "scope_id", ref invalid } if invalid == &["scope-abc"]
        ));
    }

    #[test]
    fn discovery_level_override() {
        let req = DiscoveryRequest::new("1", &["2"])
            .unwrap()
            .with_discovery_level(3);
        assert_eq!(req.discovery_level(), 3);
        assert_eq!(req.schema_id(), 1);
        assert_eq!(req.gateway_ids(), &[2]);
    }

    #[test]
    fn owned_strings_accepted() {
        let ids = vec!["7".to_owned()];
        assert_eq!(parse_gateway_ids(&ids).unwrap(), vec![7]);
    }
}
