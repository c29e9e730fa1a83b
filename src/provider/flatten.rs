//! Expand/flatten helpers
//!
//! Convert between the list/set values stored in [`ResourceData`] and the
//! nested structures the service bindings use. Element order is preserved
//! both ways.
//!
//! [`ResourceData`]: crate::schema::ResourceData

use crate::ibm::dns::{AzPool, HealthcheckHeader};
use crate::ibm::vpc::VpnGatewayMember;
use serde_json::{json, Value};

pub fn expand_string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn flatten_string_list(items: &[String]) -> Value {
    Value::from(items.to_vec())
}

fn objects(value: Option<&Value>) -> impl Iterator<Item = &serde_json::Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

pub fn expand_headers(value: Option<&Value>) -> Vec<HealthcheckHeader> {
    objects(value)
        .map(|header| HealthcheckHeader {
            name: header
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            value: expand_string_list(header.get("value")),
        })
        .collect()
}

pub fn flatten_headers(headers: &[HealthcheckHeader]) -> Value {
    headers
        .iter()
        .map(|h| json!({ "name": h.name, "value": h.value }))
        .collect()
}

pub fn expand_az_pools(value: Option<&Value>) -> Vec<AzPool> {
    objects(value)
        .map(|item| AzPool {
            availability_zone: item
                .get("availability_zone")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            pools: expand_string_list(item.get("pools")),
        })
        .collect()
}

pub fn flatten_az_pools(az_pools: &[AzPool]) -> Value {
    az_pools
        .iter()
        .map(|p| json!({ "availability_zone": p.availability_zone, "pools": p.pools }))
        .collect()
}

/// Members without a public IP are left out
pub fn flatten_vpn_members(members: &[VpnGatewayMember]) -> Value {
    members
        .iter()
        .filter_map(|member| {
            let public_ip = member.public_ip.as_ref()?;
            Some(json!({
                "address": public_ip.address,
                "role": member.role,
                "status": member.status,
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ibm::vpc::PublicIp;

    #[test]
    fn test_az_pools_keep_pairs_and_pool_order() {
        let value = json!([
            {"availability_zone": "us-south-1", "pools": ["p3", "p1", "p2"]},
            {"availability_zone": "us-south-2", "pools": ["p2"]}
        ]);
        let pools = expand_az_pools(Some(&value));
        assert_eq!(pools[0].availability_zone, "us-south-1");
        assert_eq!(pools[0].pools, vec!["p3", "p1", "p2"]);
        assert_eq!(flatten_az_pools(&pools), value);
    }

    #[test]
    fn test_headers_map_name_to_values() {
        let headers = vec![HealthcheckHeader {
            name: "Host".to_string(),
            value: vec!["a.example.com".to_string(), "b.example.com".to_string()],
        }];
        let flattened = flatten_headers(&headers);
        assert_eq!(
            flattened,
            json!([{"name": "Host", "value": ["a.example.com", "b.example.com"]}])
        );
        assert_eq!(expand_headers(Some(&flattened)), headers);
    }

    #[test]
    fn test_missing_values_expand_to_empty() {
        assert!(expand_string_list(None).is_empty());
        assert!(expand_az_pools(Some(&Value::Null)).is_empty());
        assert!(expand_headers(Some(&json!("not a list"))).is_empty());
    }

    #[test]
    fn test_vpn_members_without_public_ip_are_skipped() {
        let members = vec![
            VpnGatewayMember {
                public_ip: Some(PublicIp {
                    address: "169.61.1.1".to_string(),
                }),
                role: Some("active".to_string()),
                status: Some("available".to_string()),
            },
            VpnGatewayMember {
                public_ip: None,
                role: Some("standby".to_string()),
                status: Some("pending".to_string()),
            },
        ];
        assert_eq!(
            flatten_vpn_members(&members),
            json!([{"address": "169.61.1.1", "role": "active", "status": "available"}])
        );
    }
}
