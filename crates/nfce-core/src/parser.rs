//! NFC-e document parser
//!
//! Classifies one XML document by its root element and extracts a
//! [`DocumentRecord`] plus, for authorized invoices, one [`LineItem`] per
//! product line.
//!
//! Two shapes are recognized:
//!
//! - `<nfeProc>` / `<NFe>`: an authorized invoice with `ide`, `emit`,
//!   `dest` (optional), `total` and `det` blocks
//! - `<procEventoNFe>`: a cancellation event carrying only the access key,
//!   the issuer CNPJ and the event timestamp
//!
//! Any other root element is rejected as [`ExtractError::UnrecognizedRoot`].

use crate::error::{ExtractError, Result};
use crate::format::format_tax_id;
use crate::record::{DocumentRecord, DocumentStatus, LineItem, ParsedDocument};
use crate::xml::{
    decimal_or_zero, optional_date, rate_or_default, required_number, NfeElement,
};
use log::debug;
use rust_decimal::Decimal;

/// Length of an NF-e access key
pub const ACCESS_KEY_LEN: usize = 44;

/// Offset of the document number inside the access key
pub const KEY_NUMBER_OFFSET: usize = 25;

/// Length of the document number inside the access key
pub const KEY_NUMBER_LEN: usize = 9;

/// Model code assigned to cancellation events (NFC-e)
pub const CANCELLATION_MODEL: &str = "65";

/// Prefix of the `infNFe@Id` attribute in front of the access key
const ACCESS_KEY_PREFIX: &str = "NFe";

/// Shape of an XML document, decided from its root element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `nfeProc` or bare `NFe`
    Authorized,
    /// `procEventoNFe`
    CancellationEvent,
    /// Anything else
    Unrecognized,
}

impl DocumentKind {
    /// Classify a document by the local name of its root element
    #[must_use]
    pub fn classify(root_name: &str) -> Self {
        match root_name {
            "procEventoNFe" => Self::CancellationEvent,
            "nfeProc" | "NFe" => Self::Authorized,
            _ => Self::Unrecognized,
        }
    }
}

/// Parse one NFC-e XML document
///
/// # Errors
///
/// Returns `ExtractError` when the bytes are not UTF-8 XML, when the root
/// element is not recognized, or when a required field is missing or
/// malformed. Absent amounts default to zero and are not errors.
pub fn parse_document(bytes: &[u8]) -> Result<ParsedDocument> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let tree = roxmltree::Document::parse(text)?;
    let root = NfeElement::new(tree.root_element());

    match DocumentKind::classify(root.local_name()) {
        DocumentKind::CancellationEvent => parse_cancellation(root),
        DocumentKind::Authorized => parse_authorized(root),
        DocumentKind::Unrecognized => {
            Err(ExtractError::UnrecognizedRoot(root.local_name().to_string()))
        }
    }
}

/// Left-pad an access key with zeros to 44 characters
///
/// # Errors
///
/// Returns `ExtractError::InvalidAccessKey` for keys longer than 44 characters.
pub fn normalize_access_key(raw: &str) -> Result<String> {
    if raw.chars().count() > ACCESS_KEY_LEN {
        return Err(ExtractError::InvalidAccessKey(raw.to_string()));
    }
    Ok(format!("{raw:0>ACCESS_KEY_LEN$}"))
}

/// Document number embedded in a normalized access key
///
/// # Errors
///
/// Returns `ExtractError::InvalidNumber` when the nine-character slot is not numeric.
pub fn number_from_access_key(access_key: &str) -> Result<u64> {
    let slot = access_key.get(KEY_NUMBER_OFFSET..KEY_NUMBER_OFFSET + KEY_NUMBER_LEN);
    required_number("chNFe", slot).map_err(|_| ExtractError::InvalidNumber {
        field: "chNFe",
        value: access_key.to_string(),
    })
}

fn parse_cancellation(root: NfeElement<'_, '_>) -> Result<ParsedDocument> {
    let raw_key = root
        .descendant("chNFe")
        .and_then(|e| e.text())
        .ok_or(ExtractError::MissingElement("chNFe"))?;
    let access_key = normalize_access_key(raw_key)?;
    let document_number = number_from_access_key(&access_key)?;

    let issuer = root
        .descendant("CNPJ")
        .and_then(|e| e.text())
        .unwrap_or_default();
    let event_time = root.descendant("dhEvento").and_then(|e| e.text());

    debug!("Cancellation event for document {document_number}");

    Ok(ParsedDocument {
        document: DocumentRecord {
            document_number,
            access_key,
            status: DocumentStatus::CancellationHomologated,
            model: CANCELLATION_MODEL.to_string(),
            issuer_tax_id: format_tax_id(issuer),
            recipient_tax_id: String::new(),
            recipient_state: String::new(),
            total_value: Decimal::ZERO,
            issue_date: optional_date("dhEvento", event_time)?,
        },
        line_items: Vec::new(),
    })
}

fn parse_authorized(root: NfeElement<'_, '_>) -> Result<ParsedDocument> {
    let ide = root.require_descendant("ide")?;
    let emit = root.require_descendant("emit")?;
    let total = root.require_descendant("total")?;
    let inf_nfe = root.require_descendant("infNFe")?;
    let dest = root.descendant("dest");

    let document_number = required_number("nNF", ide.text_at(&["nNF"]))?;

    let id = inf_nfe
        .attribute("Id")
        .ok_or(ExtractError::MissingAttribute {
            element: "infNFe",
            attribute: "Id",
        })?;
    let access_key = normalize_access_key(id.strip_prefix(ACCESS_KEY_PREFIX).unwrap_or(id))?;

    let (recipient_tax_id, recipient_state) = dest.map_or_else(
        || (String::new(), String::new()),
        |dest| {
            let tax_id = dest
                .text_at(&["CNPJ"])
                .or_else(|| dest.text_at(&["CPF"]))
                .unwrap_or_default();
            let state = dest.text_at(&["enderDest", "UF"]).unwrap_or_default();
            (format_tax_id(tax_id), state.to_string())
        },
    );

    let document = DocumentRecord {
        document_number,
        access_key,
        status: DocumentStatus::Authorized,
        model: ide.text_at(&["mod"]).unwrap_or_default().to_string(),
        issuer_tax_id: format_tax_id(emit.text_at(&["CNPJ"]).unwrap_or_default()),
        recipient_tax_id,
        recipient_state,
        total_value: decimal_or_zero("vNF", total.text_at(&["ICMSTot", "vNF"]))?,
        issue_date: optional_date("dhEmi", ide.text_at(&["dhEmi"]))?,
    };

    let line_items = root
        .descendants("det")
        .map(parse_line_item)
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Authorized document {} with {} line items",
        document.document_number,
        line_items.len()
    );

    Ok(ParsedDocument {
        document,
        line_items,
    })
}

/// Text of a field inside the ICMS group of a product line
///
/// The group is wrapped in a regime-specific element (`ICMS00`, `ICMS20`,
/// `ICMSSN102`, ...), so any child of `ICMS` is searched.
fn icms_text<'a>(det: NfeElement<'a, '_>, field: &str) -> Option<&'a str> {
    det.descendants("ICMS")
        .flat_map(|icms| icms.element_children())
        .find_map(|group| group.text_at(&[field]))
}

fn parse_line_item(det: NfeElement<'_, '_>) -> Result<LineItem> {
    Ok(LineItem {
        tax_situation_code: icms_text(det, "CST").map(str::to_string),
        operation_code: det
            .descendant("CFOP")
            .and_then(|e| e.text())
            .map(str::to_string),
        product_value: decimal_or_zero(
            "vProd",
            det.descendants("prod").find_map(|prod| prod.text_at(&["vProd"])),
        )?,
        tax_base_value: decimal_or_zero("vBC", icms_text(det, "vBC"))?,
        tax_rate: rate_or_default("pICMS", icms_text(det, "pICMS"))?,
        tax_amount: decimal_or_zero("vICMS", icms_text(det, "vICMS"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::prelude::*;

    fn authorized(number: &str, dest: &str, total: &str, dets: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe Id="NFe35240312345678000195650010000001231000001234" versao="4.00">
      <ide><cUF>35</cUF><mod>65</mod><nNF>{number}</nNF><dhEmi>2024-03-05T10:15:00-03:00</dhEmi></ide>
      <emit><CNPJ>12345678000195</CNPJ><xNome>Loja</xNome></emit>
      {dest}
      {dets}
      <total>{total}</total>
    </infNFe>
  </NFe>
  <protNFe><infProt><chNFe>35240312345678000195650010000001231000001234</chNFe></infProt></protNFe>
</nfeProc>"#
        )
    }

    const DET: &str = r"<det nItem='1'>
        <prod><CFOP>5102</CFOP><vProd>100.00</vProd></prod>
        <imposto><ICMS><ICMS00><orig>0</orig><CST>00</CST><vBC>100.00</vBC><pICMS>18.0000</pICMS><vICMS>18.00</vICMS></ICMS00></ICMS></imposto>
      </det>";

    const CANCELLATION: &str = r#"<procEventoNFe xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.00">
  <evento versao="1.00">
    <infEvento Id="ID1101113524031234567800019565001000000124100000124501">
      <cOrgao>35</cOrgao>
      <CNPJ>12345678000195</CNPJ>
      <chNFe>35240312345678000195650010000001241000001245</chNFe>
      <dhEvento>2024-03-06T08:00:00-03:00</dhEvento>
      <tpEvento>110111</tpEvento>
    </infEvento>
  </evento>
</procEventoNFe>"#;

    #[test]
    fn test_classify() {
        assert_eq!(DocumentKind::classify("nfeProc"), DocumentKind::Authorized);
        assert_eq!(DocumentKind::classify("NFe"), DocumentKind::Authorized);
        assert_eq!(
            DocumentKind::classify("procEventoNFe"),
            DocumentKind::CancellationEvent
        );
        assert_eq!(DocumentKind::classify("resNFe"), DocumentKind::Unrecognized);
    }

    #[test]
    fn test_parse_authorized() {
        let dest = "<dest><CPF>12345678901</CPF><enderDest><UF>SP</UF></enderDest></dest>";
        let xml = authorized("123", dest, "<ICMSTot><vNF>100.00</vNF></ICMSTot>", DET);

        let parsed = parse_document(xml.as_bytes()).expect("Failed to parse authorized invoice");
        let doc = &parsed.document;

        assert_eq!(doc.document_number, 123);
        assert_eq!(doc.access_key, "35240312345678000195650010000001231000001234");
        assert_eq!(doc.status, DocumentStatus::Authorized);
        assert_eq!(doc.model, "65");
        assert_eq!(doc.issuer_tax_id, "12.345.678/0001-95");
        assert_eq!(doc.recipient_tax_id, "123.456.789-01");
        assert_eq!(doc.recipient_state, "SP");
        assert_eq!(doc.total_value, Decimal::from(100));
        assert_eq!(doc.issue_date, NaiveDate::from_ymd_opt(2024, 3, 5));

        assert_eq!(parsed.line_items.len(), 1);
        let item = &parsed.line_items[0];
        assert_eq!(item.tax_situation_code.as_deref(), Some("00"));
        assert_eq!(item.operation_code.as_deref(), Some("5102"));
        assert_eq!(item.product_value, Decimal::from(100));
        assert_eq!(item.tax_base_value, Decimal::from(100));
        assert_eq!(item.tax_rate, "18.00");
        assert_eq!(item.tax_amount, Decimal::from(18));
    }

    #[test]
    fn test_recipient_prefers_cnpj() {
        let dest = "<dest><CNPJ>98765432000110</CNPJ><CPF>12345678901</CPF></dest>";
        let xml = authorized("1", dest, "<ICMSTot><vNF>1</vNF></ICMSTot>", "");
        let parsed = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(parsed.document.recipient_tax_id, "98.765.432/0001-10");
        assert_eq!(parsed.document.recipient_state, "");
    }

    #[test]
    fn test_missing_recipient_and_total_default_to_empty_and_zero() {
        let xml = authorized("7", "", "<ICMSTot></ICMSTot>", "");
        let parsed = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(parsed.document.recipient_tax_id, "");
        assert_eq!(parsed.document.recipient_state, "");
        assert_eq!(parsed.document.total_value, Decimal::ZERO);
        assert!(parsed.line_items.is_empty());
    }

    #[test]
    fn test_line_item_defaults() {
        let det = "<det nItem='1'><prod><CFOP>5405</CFOP></prod>\
                   <imposto><ICMS><ICMSSN500><CSOSN>500</CSOSN></ICMSSN500></ICMS></imposto></det>";
        let xml = authorized("8", "", "<ICMSTot><vNF>0</vNF></ICMSTot>", det);
        let parsed = parse_document(xml.as_bytes()).unwrap();

        let item = &parsed.line_items[0];
        assert_eq!(item.tax_situation_code, None);
        assert_eq!(item.operation_code.as_deref(), Some("5405"));
        assert_eq!(item.product_value, Decimal::ZERO);
        assert_eq!(item.tax_base_value, Decimal::ZERO);
        assert_eq!(item.tax_rate, "0.00");
        assert_eq!(item.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn test_non_numeric_document_number_fails() {
        let xml = authorized("12A", "", "<ICMSTot><vNF>1</vNF></ICMSTot>", "");
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::InvalidNumber { field: "nNF", .. })
        ));
    }

    #[test]
    fn test_unparseable_total_fails() {
        let xml = authorized("1", "", "<ICMSTot><vNF>cem</vNF></ICMSTot>", "");
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::InvalidDecimal { field: "vNF", .. })
        ));
    }

    #[test]
    fn test_missing_required_block_fails() {
        let xml = authorized("1", "", "<ICMSTot/>", "").replace("<total>", "<totalx>");
        let xml = xml.replace("</total>", "</totalx>");
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::MissingElement("total"))
        ));
    }

    #[test]
    fn test_parse_cancellation() {
        let parsed = parse_document(CANCELLATION.as_bytes()).expect("Failed to parse event");
        let doc = &parsed.document;

        assert_eq!(doc.status, DocumentStatus::CancellationHomologated);
        assert_eq!(doc.access_key.len(), ACCESS_KEY_LEN);
        assert_eq!(doc.document_number, 124);
        assert_eq!(
            doc.document_number,
            doc.access_key[25..34].parse::<u64>().unwrap()
        );
        assert_eq!(doc.model, "65");
        assert_eq!(doc.issuer_tax_id, "12.345.678/0001-95");
        assert_eq!(doc.recipient_tax_id, "");
        assert_eq!(doc.total_value, Decimal::ZERO);
        assert_eq!(doc.issue_date, NaiveDate::from_ymd_opt(2024, 3, 6));
        assert!(parsed.line_items.is_empty());
    }

    #[test]
    fn test_cancellation_without_key_fails() {
        let xml = CANCELLATION.replace("chNFe", "chave");
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::MissingElement("chNFe"))
        ));
    }

    #[test]
    fn test_cancellation_without_issuer() {
        let xml = CANCELLATION.replace("<CNPJ>12345678000195</CNPJ>", "");
        let parsed = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(parsed.document.issuer_tax_id, "");
        assert_eq!(parsed.document.document_number, 124);
    }

    #[test]
    fn test_any_event_counts_as_cancellation() {
        let xml = CANCELLATION.replace("110111", "210200");
        let parsed = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(
            parsed.document.status,
            DocumentStatus::CancellationHomologated
        );
    }

    #[test]
    fn test_missing_key_attribute_fails() {
        let xml = authorized("1", "", "<ICMSTot/>", "").replace(
            r#"Id="NFe35240312345678000195650010000001231000001234" "#,
            "",
        );
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_malformed_issue_date_fails() {
        let xml = authorized("1", "", "<ICMSTot/>", "").replace("2024-03-05T", "05/03/2024T");
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_unrecognized_root() {
        let xml = r#"<resNFe xmlns="http://www.portalfiscal.inf.br/nfe"/>"#;
        assert!(matches!(
            parse_document(xml.as_bytes()),
            Err(ExtractError::UnrecognizedRoot(name)) if name == "resNFe"
        ));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_document(b"<nfeProc><NFe>"),
            Err(ExtractError::Xml(_))
        ));
        assert!(matches!(
            parse_document(&[0xff, 0xfe, 0x00]),
            Err(ExtractError::Utf8(_))
        ));
    }

    #[test]
    fn test_normalize_access_key() {
        assert_eq!(normalize_access_key("123").unwrap(), format!("{}123", "0".repeat(41)));
        let full = "1".repeat(44);
        assert_eq!(normalize_access_key(&full).unwrap(), full);
        assert!(normalize_access_key(&"1".repeat(45)).is_err());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(CANCELLATION.as_bytes());
        assert!(parse_document(&bytes).is_ok());
    }
}
