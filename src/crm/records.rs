// Raw CRM payload schema. Every field is optional here; the normalizer decides
// which ones a usable record must carry.
use serde::Deserialize;
use serde_json::Value;

/// One page of a HAL collection response.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(rename = "_embedded")]
    pub embedded: PageItems,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageItems {
    #[serde(default)]
    pub limeobjects: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageLinks {
    pub next: Option<Link>,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Option-set field such as `dealstatus` or `buyingstatus`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionField {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDeal {
    #[serde(rename = "_id")]
    pub id: Option<i64>,
    #[serde(rename = "_descriptive")]
    pub descriptive: Option<String>,
    pub value: Option<f64>,
    pub dealstatus: Option<OptionField>,
    pub closeddate: Option<String>,
    pub company: Option<i64>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<RawDealEmbedded>,
}

/// Embedded company data stays undecoded here, so a bad company cannot sink its deal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDealEmbedded {
    pub relation_company: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCompany {
    #[serde(rename = "_id")]
    pub id: Option<i64>,
    #[serde(rename = "_descriptive")]
    pub descriptive: Option<String>,
    pub name: Option<String>,
    pub buyingstatus: Option<OptionField>,
    pub www: Option<String>,
    pub phone: Option<String>,
    pub postaladdress1: Option<String>,
    pub postalzipcode: Option<String>,
    pub postalcity: Option<String>,
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_without_next_link_ends_pagination() {
        let page: Page = serde_json::from_value(json!({
            "_embedded": { "limeobjects": [{ "_id": 1 }, { "_id": 2 }] },
            "_links": { "self": { "href": "http://crm/deal/" } }
        }))
        .unwrap();
        assert_eq!(page.embedded.limeobjects.len(), 2);
        assert!(page.links.next.is_none());
    }

    #[test]
    fn page_without_embedded_block_is_rejected() {
        let result = serde_json::from_value::<Page>(json!({ "_links": {} }));
        assert!(result.is_err());
    }

    #[test]
    fn deal_with_embedded_company_decodes() {
        let deal: RawDeal = serde_json::from_value(json!({
            "_id": 1001,
            "_descriptive": "Coffee machines",
            "value": 2500,
            "dealstatus": { "id": 3, "key": "agreement", "text": "Agreement" },
            "closeddate": "2019-04-02T00:00:00+02:00",
            "company": 42,
            "_embedded": {
                "relation_company": { "_id": 42, "name": "Acme", "buyingstatus": { "key": "active" } }
            }
        }))
        .unwrap();
        assert_eq!(deal.value, Some(2500.0));
        assert_eq!(deal.dealstatus.and_then(|s| s.key).as_deref(), Some("agreement"));
        let company: RawCompany =
            serde_json::from_value(deal.embedded.and_then(|e| e.relation_company).unwrap()).unwrap();
        assert_eq!(company.name.as_deref(), Some("Acme"));
        assert!(company.www.is_none());
    }
}
