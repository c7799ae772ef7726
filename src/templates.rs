//! Built-in template schema and sample payloads for testing and
//! demonstration.

use std::collections::HashMap;

use chrono::TimeZone;

use crate::payload::{
    BudgetLine, Client, Company, DocumentMeta, DocumentPayload, LineLevel, OutputMode,
    SectionData, Totals, VatGroup,
};
use crate::schema::{
    ComponentConfig, PageGeometry, SectionLayout, TemplateSchema, Visibility,
};

fn component(visibility: Option<Visibility>, fixed_y: f32, margin_bottom: f32) -> ComponentConfig {
    ComponentConfig {
        markup: None,
        visibility,
        fixed_y,
        margin_bottom,
    }
}

/// The standard three-section quote template: summary → budget → conditions.
pub fn standard_quote_schema() -> TemplateSchema {
    let mut components = HashMap::new();
    components.insert("company".to_string(), component(None, 0.0, 12.0));
    components.insert("separator".to_string(), component(None, 0.0, 10.0));
    components.insert("title".to_string(), component(None, 0.0, 10.0));
    components.insert("client".to_string(), component(None, 0.0, 8.0));
    components.insert("levels".to_string(), component(None, 0.0, 12.0));
    components.insert("totals".to_string(), component(None, 0.0, 12.0));
    components.insert("note".to_string(), component(None, 0.0, 6.0));
    components.insert(
        "signatures".to_string(),
        component(Some(Visibility::Last), 0.0, 0.0),
    );
    components.insert(
        "pagination".to_string(),
        component(Some(Visibility::All), 810.0, 0.0),
    );

    TemplateSchema {
        page: PageGeometry {
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            width: 595.28,
            height: 841.89,
            margin_top: 40.0,
            margin_left: 40.0,
            margin_right: 40.0,
            content_lower_bound: 780.0,
            general_margin: 4.0,
        },
        components,
        sections: vec![
            SectionLayout {
                name: "summary".to_string(),
                header: vec!["company".to_string(), "separator".to_string()],
                content: vec![
                    "title".to_string(),
                    "client".to_string(),
                    "note".to_string(),
                ],
                footer: vec!["pagination".to_string()],
            },
            SectionLayout {
                name: "budget".to_string(),
                header: vec!["company".to_string(), "separator".to_string()],
                content: vec![
                    "title".to_string(),
                    "levels".to_string(),
                    "totals".to_string(),
                ],
                footer: vec!["pagination".to_string()],
            },
            SectionLayout {
                name: "conditions".to_string(),
                header: vec!["company".to_string(), "separator".to_string()],
                content: vec!["title".to_string(), "note".to_string()],
                footer: vec!["pagination".to_string(), "signatures".to_string()],
            },
        ],
    }
}

fn line(
    level: LineLevel,
    id: &str,
    name: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
    unit_price: Option<f64>,
    amount: f64,
) -> BudgetLine {
    BudgetLine {
        level,
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        unit: unit.map(str::to_string),
        quantity,
        percentage: None,
        unit_price,
        amount,
    }
}

/// A small but complete quote payload exercising every component.
pub fn sample_payload() -> DocumentPayload {
    DocumentPayload {
        company: Company {
            logo: None,
            name: "Vega Reforms S.L.".to_string(),
            tax_id: Some("B-84210355".to_string()),
            address: Some("Calle Mayor 12, 28013 Madrid".to_string()),
            contact: Some("info@vegareforms.example / +34 910 000 000".to_string()),
            template_id: Some("standard".to_string()),
            style_overrides: Vec::new(),
        },
        meta: DocumentMeta {
            title: "Quote Q-2026-018".to_string(),
            author: "Vega Reforms S.L.".to_string(),
            subject: "Bathroom refurbishment".to_string(),
            producer: "quotepress".to_string(),
            keywords: vec!["quote".to_string(), "refurbishment".to_string()],
            created: Some(chrono::Utc.with_ymd_and_hms(2026, 2, 10, 9, 30, 0).unwrap()),
            modified: None,
        },
        mode: OutputMode::Final,
        sections: vec![
            SectionData {
                name: "summary".to_string(),
                client: Some(Client {
                    name: "Marta Ortiz".to_string(),
                    tax_id: Some("51234567-L".to_string()),
                    address: Some("Av. de América 4, 28028 Madrid".to_string()),
                    contact: None,
                }),
                title: Some("Refurbishment quote".to_string()),
                note: Some(
                    "Complete refurbishment of the main bathroom as discussed on site.\n\n\
                     Work can start two weeks after acceptance."
                        .to_string(),
                ),
                levels: Vec::new(),
                totals: None,
            },
            SectionData {
                name: "budget".to_string(),
                client: None,
                title: Some("Itemized budget".to_string()),
                note: None,
                levels: vec![
                    line(LineLevel::Chapter, "1", "Demolition", None, None, None, 420.0),
                    line(
                        LineLevel::Item,
                        "1.1",
                        "Remove existing tiling",
                        Some(18.0),
                        Some("m2"),
                        Some(15.0),
                        270.0,
                    ),
                    line(
                        LineLevel::Item,
                        "1.2",
                        "Remove sanitary fittings",
                        Some(3.0),
                        Some("ud"),
                        Some(50.0),
                        150.0,
                    ),
                    line(LineLevel::Chapter, "2", "Installation", None, None, None, 1380.0),
                    line(
                        LineLevel::Item,
                        "2.1",
                        "Wall and floor tiling",
                        Some(18.0),
                        Some("m2"),
                        Some(45.0),
                        810.0,
                    ),
                    line(
                        LineLevel::Item,
                        "2.2",
                        "Install new sanitary fittings",
                        Some(3.0),
                        Some("ud"),
                        Some(190.0),
                        570.0,
                    ),
                ],
                totals: Some(Totals {
                    base: 1800.0,
                    vat_groups: vec![VatGroup {
                        rate: 21.0,
                        base: 1800.0,
                        amount: 378.0,
                    }],
                    subtotal: Some(2178.0),
                    withholding: None,
                    surcharges: Vec::new(),
                    total: 2178.0,
                }),
            },
            SectionData {
                name: "conditions".to_string(),
                client: Some(Client {
                    name: "Marta Ortiz".to_string(),
                    tax_id: None,
                    address: None,
                    contact: None,
                }),
                title: Some("Conditions".to_string()),
                note: Some(
                    "<p>50% on acceptance, 50% on completion.</p>\
                     <p>This quote is valid for 30 days.</p>\
                     <p>Any change to the scope will be quoted separately.</p>"
                        .to_string(),
                ),
                levels: Vec::new(),
                totals: None,
            },
        ],
    }
}
