//! Attraction lookup data

use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiError;
use super::transport::ApiRequest;
use crate::models::RegionGroup;

/// Provinces and their districts.
pub async fn get_regions(client: &ApiClient) -> Result<Vec<RegionGroup>, ApiError> {
    let payload = client.send(ApiRequest::get("/trip/attraction/region")).await?;
    parse_regions(payload)
}

/// The list comes bare, or nested under `data` or `response`.
fn parse_regions(payload: Value) -> Result<Vec<RegionGroup>, ApiError> {
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => map
            .remove("data")
            .filter(Value::is_array)
            .or_else(|| map.remove("response").filter(Value::is_array))
            .unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    serde_json::from_value(list).map_err(|e| ApiError::Decode(format!("region list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{test_client, MockBackend};
    use crate::api::Envelope;
    use serde_json::json;
    use std::sync::Arc;

    fn seoul() -> Value {
        json!({
            "sido": {"sidoCode": 1, "sidoName": "서울특별시"},
            "guguns": [{"gugunCode": 1, "gugunName": "강남구"}]
        })
    }

    #[test]
    fn test_parse_regions_shapes() {
        assert_eq!(parse_regions(json!([seoul()])).unwrap().len(), 1);
        assert_eq!(parse_regions(json!({"data": [seoul()]})).unwrap().len(), 1);
        assert_eq!(
            parse_regions(json!({"response": [seoul(), seoul()]})).unwrap().len(),
            2
        );
        assert!(parse_regions(json!({"unexpected": true})).unwrap().is_empty());
        assert!(parse_regions(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_parse_regions_bad_entries() {
        let err = parse_regions(json!([{"sido": {"sidoName": "서울"}}])).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_regions() {
        let backend = Arc::new(MockBackend::new(|_, _| Ok(Envelope::ok(json!([seoul()])))));
        let (client, _, _) = test_client(backend.clone(), None);

        let regions = get_regions(&client).await.unwrap();

        assert_eq!(backend.last_call().path, "/trip/attraction/region");
        assert_eq!(regions[0].sido.sido_name, "서울특별시");
        assert_eq!(regions[0].guguns[0].gugun_name, "강남구");
    }
}
