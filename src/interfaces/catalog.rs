use crate::domain::recipient::Recipient;
use crate::error::Result;
use std::io::Read;

/// Reads an ordered recipient catalog from a JSON array of
/// `{id, type, name, points?, limit?}` objects.
pub fn read_catalog<R: Read>(source: R) -> Result<Vec<Recipient>> {
    let recipients: Vec<Recipient> = serde_json::from_reader(source)?;
    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::recipient::RecipientType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalog_preserves_order_and_optional_fields() {
        let json = r#"[
            { "id": "A", "type": "candidate", "points": 2, "name": "Alpha" },
            { "id": "B", "type": "candidate", "points": 3, "name": "Beta", "limit": "500" },
            { "id": "R1", "type": "pac", "name": "Some PAC" },
            { "id": "R2", "type": "c4", "name": "Some C4" }
        ]"#;
        let catalog = read_catalog(json.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog[0].id, "A");
        assert!(catalog[0].is_weighted());
        assert_eq!(catalog[1].limit, Some(Money::new(dec!(500))));
        assert_eq!(catalog[2].r#type, RecipientType::Pac);
        assert!(!catalog[3].is_weighted());
    }

    #[test]
    fn test_malformed_catalog_is_an_error() {
        let json = r#"[{ "id": "A", "type": "senate", "name": "Alpha" }]"#;
        assert!(read_catalog(json.as_bytes()).is_err());
    }
}
