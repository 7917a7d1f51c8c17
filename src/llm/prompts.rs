// Static prompt for the factsheet explanation. It lists the sections of the
// factsheet, not the uploaded numbers.

pub const EXPLANATION_PROMPT: &str = r#"
Provide a detailed explanation of the factsheet. Include:
- Key trends in investment growth.
- Performance metrics (e.g., Return, Std Dev, Information Ratio).
- Regional and sector breakdowns.
- Yearly performance analysis.
- Importance of the disclosures section.
"#;
