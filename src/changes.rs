use crate::endpoint::Endpoint;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

/// Pair with direction
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FromTo<T> {
    pub from: T,
    pub to: T,
}

/// The change-set the planner hands to a provider.
/// On the wire the updates are two parallel lists, `UpdateOld` and
/// `UpdateNew`, where the element at index i of one pairs with index i of
/// the other. Here they are kept as pairs, so the lengths always agree
/// when encoding, and a payload whose lengths differ is rejected.
/// ExternalDNS sends `null` for empty lists, and Go decodes field names
/// case-insensitively, so the camelCase spellings are accepted as well.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Changes {
    #[serde(rename = "Create", alias = "create")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub create: Vec<Endpoint>,
    #[serde(flatten, with = "serde_fromto")]
    pub update: Vec<FromTo<Endpoint>>,
    #[serde(rename = "Delete", alias = "delete")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub delete: Vec<Endpoint>,
}
impl Changes {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Pre-images of the updates, in order.
    pub fn update_old(&self) -> impl Iterator<Item = &Endpoint> {
        self.update.iter().map(|ft| &ft.from)
    }

    /// Post-images of the updates, in order.
    pub fn update_new(&self) -> impl Iterator<Item = &Endpoint> {
        self.update.iter().map(|ft| &ft.to)
    }
}

mod serde_fromto {
    use super::FromTo;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_with::{DefaultOnNull, serde_as};

    #[derive(Serialize)]
    struct FromTosRef<'a, T> {
        #[serde(rename = "UpdateOld")]
        old: Vec<&'a T>,
        #[serde(rename = "UpdateNew")]
        new: Vec<&'a T>,
    }

    #[serde_as]
    #[derive(Deserialize)]
    #[serde(default, bound(deserialize = "T: Deserialize<'de>"))]
    struct FromTos<T> {
        #[serde(rename = "UpdateOld", alias = "updateOld")]
        #[serde_as(deserialize_as = "DefaultOnNull")]
        old: Vec<T>,
        #[serde(rename = "UpdateNew", alias = "updateNew")]
        #[serde_as(deserialize_as = "DefaultOnNull")]
        new: Vec<T>,
    }
    impl<T> Default for FromTos<T> {
        fn default() -> Self {
            Self {
                old: Default::default(),
                new: Default::default(),
            }
        }
    }

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(fts: &Vec<FromTo<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let out = FromTosRef {
            old: fts.iter().map(|ft| &ft.from).collect(),
            new: fts.iter().map(|ft| &ft.to).collect(),
        };

        out.serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<FromTo<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let the_in = FromTos::deserialize(deserializer)?;
        if the_in.old.len() == the_in.new.len() {
            let ret: Vec<FromTo<_>> = std::iter::zip(the_in.old, the_in.new)
                .map(|(from, to)| FromTo { from, to })
                .collect();
            Ok(ret)
        } else {
            Err(D::Error::custom(format!(
                "The count of old ({}) and new ({}) data are not the same",
                the_in.old.len(),
                the_in.new.len()
            )))
        }
    }
}
