//! Administrative region lookup data (province / district codes)

use serde::de;
use serde::{Deserialize, Serialize};

fn region_code<'de, D: de::Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("region code as integer or numeric string")
        }
        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u64, E> {
            Ok(v)
        }
        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u64, E> {
            v.parse().map_err(E::custom)
        }
    }
    d.deserialize_any(Visitor)
}

/// Missing and `null` both mean no districts.
fn null_as_empty<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: de::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

/// Province-level region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sido {
    #[serde(deserialize_with = "region_code")]
    pub sido_code: u64,
    pub sido_name: String,
}

/// District within a province
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gugun {
    #[serde(deserialize_with = "region_code")]
    pub gugun_code: u64,
    pub gugun_name: String,
}

/// A province with its districts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGroup {
    pub sido: Sido,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub guguns: Vec<Gugun>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_accept_numbers_and_strings() {
        let group: RegionGroup = serde_json::from_str(
            r#"{
                "sido": {"sidoCode": "39", "sidoName": "제주특별자치도"},
                "guguns": [{"gugunCode": 4, "gugunName": "서귀포시"}]
            }"#,
        )
        .unwrap();
        assert_eq!(group.sido.sido_code, 39);
        assert_eq!(group.guguns[0].gugun_code, 4);
        assert_eq!(group.guguns[0].gugun_name, "서귀포시");
    }

    #[test]
    fn test_missing_guguns() {
        let group: RegionGroup =
            serde_json::from_str(r#"{"sido": {"sidoCode": 8, "sidoName": "세종특별자치시"}}"#)
                .unwrap();
        assert!(group.guguns.is_empty());
    }

    #[test]
    fn test_null_guguns() {
        let groups: Vec<RegionGroup> = serde_json::from_str(
            r#"[
                {"sido": {"sidoCode": 8, "sidoName": "세종특별자치시"}, "guguns": null},
                {"sido": {"sidoCode": 1, "sidoName": "서울특별시"},
                 "guguns": [{"gugunCode": "1", "gugunName": "강남구"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].guguns.is_empty());
        assert_eq!(groups[1].guguns[0].gugun_name, "강남구");
    }
}
