use std::{collections::HashMap, convert::Infallible, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, DeserializeFromStr, SerializeDisplay, serde_as, skip_serializing_none};

/// DNS record with the extra information ExternalDNS carries along.
/// Every field is optional on the wire. Missing or `null` values decode to
/// empty ones, and empty ones are left out when encoding, the same way
/// ExternalDNS itself does it.
/// Nothing in this crate looks into the fields, records are carried as is.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub dns_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub targets: Vec<String>,
    pub record_type: Option<RecordType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub set_identifier: String,
    #[serde(rename = "recordTTL")]
    pub record_ttl: Option<i64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub labels: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}
impl Endpoint {
    pub fn new(dns_name: impl Into<String>, record_type: RecordType, targets: Vec<String>) -> Self {
        Endpoint {
            dns_name: dns_name.into(),
            targets,
            record_type: Some(record_type),
            ..Default::default()
        }
    }

    /// Identity of the record within one snapshot.
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            dns_name: self.dns_name.clone(),
            record_type: self.record_type.clone(),
            set_identifier: self.set_identifier.clone(),
        }
    }
}

/// `(dnsName, recordType, setIdentifier)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub dns_name: String,
    pub record_type: Option<RecordType>,
    pub set_identifier: String,
}

/// Provider specific attribute, kept in the order it was received.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// DNS records types
/// Types this crate does not know of are kept verbatim in `Other`.
#[derive(SerializeDisplay, DeserializeFromStr, Debug, PartialEq, Eq, Hash, Clone)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    TXT,
    SRV,
    NS,
    PTR,
    MX,
    NAPTR,
    Other(String),
}
impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::TXT => "TXT",
            RecordType::SRV => "SRV",
            RecordType::NS => "NS",
            RecordType::PTR => "PTR",
            RecordType::MX => "MX",
            RecordType::NAPTR => "NAPTR",
            RecordType::Other(s) => s,
        };
        f.write_str(s)
    }
}
impl FromStr for RecordType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "A" => RecordType::A,
            "AAAA" => RecordType::AAAA,
            "CNAME" => RecordType::CNAME,
            "TXT" => RecordType::TXT,
            "SRV" => RecordType::SRV,
            "NS" => RecordType::NS,
            "PTR" => RecordType::PTR,
            "MX" => RecordType::MX,
            "NAPTR" => RecordType::NAPTR,
            other => RecordType::Other(other.to_string()),
        })
    }
}
