//! Keyword-based risk scoring over document text.

use std::fmt;

const RISK_CATEGORIES: &[(&str, &[&str])] = &[
    ("Market Risk", &["market", "volatility", "fluctuation", "price", "value", "trading"]),
    ("Credit Risk", &["credit", "debt", "loan", "borrower", "default", "payment"]),
    ("Operational Risk", &["operational", "process", "system", "technology", "fraud"]),
    ("Liquidity Risk", &["liquidity", "cash", "funding", "capital", "assets"]),
    ("Regulatory Risk", &["regulatory", "compliance", "legal", "government", "policy"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn for_category(score: usize) -> Self {
        match score {
            s if s > 5 => RiskLevel::High,
            s if s > 2 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    fn overall(total: usize) -> Self {
        match total {
            t if t > 15 => RiskLevel::High,
            t if t > 8 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: &'static str,
    pub score: usize,
    pub level: RiskLevel,
    pub keywords: Vec<&'static str>,
}

/// Only categories with at least one keyword hit are listed.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub categories: Vec<CategoryScore>,
    pub total_score: usize,
    pub overall: RiskLevel,
}

impl RiskAssessment {
    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == name)
    }

    pub fn render(&self) -> String {
        let mut report = String::from("\n=== RISK ASSESSMENT REPORT ===\n\n");

        if self.categories.is_empty() {
            report.push_str("No significant risk indicators found in the document.\n");
            report.push_str("Continue regular monitoring and assessment.\n");
            return report;
        }

        report.push_str("**Identified Risk Categories:**\n");
        for category in &self.categories {
            report.push_str(&format!("\n{} ({} Risk):\n", category.category, category.level));
            report.push_str(&format!("- Risk Score: {}\n", category.score));
            report.push_str(&format!("- Keywords Found: {}\n", category.keywords.join(", ")));
        }

        report.push_str(&format!("\n**Overall Risk Assessment: {} Risk**\n", self.overall));
        report.push_str(&format!("Total Risk Score: {}\n\n", self.total_score));

        report.push_str("**Risk Mitigation Strategies:**\n");
        report.push_str("1. Implement comprehensive risk monitoring system\n");
        report.push_str("2. Develop contingency plans for high-risk areas\n");
        report.push_str("3. Regular risk assessment and reporting\n");
        report.push_str("4. Diversification to spread risk exposure\n");
        report.push_str("5. Maintain adequate capital reserves\n");
        report.push_str("6. Stay updated with regulatory changes\n");
        report.push_str("7. Implement internal controls and audits\n");

        if self.overall == RiskLevel::High {
            report.push_str("\n**High Risk Alert:**\n");
            report.push_str("- Immediate attention required\n");
            report.push_str("- Consider risk reduction strategies\n");
            report.push_str("- Increase monitoring frequency\n");
        }

        report
    }
}

pub fn assess_risk(financial_document_data: &str) -> RiskAssessment {
    let text = financial_document_data.to_lowercase();

    let categories: Vec<CategoryScore> = RISK_CATEGORIES
        .iter()
        .filter_map(|(category, keywords)| {
            let mut score = 0;
            let mut found = Vec::new();
            for keyword in keywords.iter() {
                let count = text.matches(keyword).count();
                if count > 0 {
                    score += count;
                    found.push(*keyword);
                }
            }
            (score > 0).then(|| CategoryScore {
                category,
                score,
                level: RiskLevel::for_category(score),
                keywords: found,
            })
        })
        .collect();

    let total_score = categories.iter().map(|c| c.score).sum();

    RiskAssessment {
        categories,
        total_score,
        overall: RiskLevel::overall(total_score),
    }
}

/// Tool entry point.
pub fn risk_report(financial_document_data: &str) -> String {
    assess_risk(financial_document_data).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_levels() {
        // 3 credit hits -> Medium, 1 liquidity hit -> Low
        let assessment = assess_risk("Debt rose. New loan signed. Default risk. Cash on hand.");

        let credit = assessment.category("Credit Risk").unwrap();
        assert_eq!(credit.score, 3);
        assert_eq!(credit.level, RiskLevel::Medium);
        assert_eq!(credit.keywords, vec!["debt", "loan", "default"]);

        let liquidity = assessment.category("Liquidity Risk").unwrap();
        assert_eq!(liquidity.level, RiskLevel::Low);

        assert!(assessment.category("Regulatory Risk").is_none());
        assert_eq!(assessment.total_score, 4);
        assert_eq!(assessment.overall, RiskLevel::Low);
    }

    #[test]
    fn test_high_overall_risk_adds_alert() {
        let text = "market ".repeat(10) + &"debt ".repeat(7);
        let assessment = assess_risk(&text);

        assert_eq!(assessment.total_score, 17);
        assert_eq!(assessment.overall, RiskLevel::High);
        assert_eq!(assessment.category("Market Risk").unwrap().level, RiskLevel::High);

        let report = assessment.render();
        assert!(report.contains("**Overall Risk Assessment: High Risk**"));
        assert!(report.contains("**High Risk Alert:**"));
    }

    #[test]
    fn test_medium_overall_boundary() {
        let assessment = assess_risk(&"credit ".repeat(9));
        assert_eq!(assessment.overall, RiskLevel::Medium);

        let assessment = assess_risk(&"credit ".repeat(8));
        assert_eq!(assessment.overall, RiskLevel::Low);
    }

    #[test]
    fn test_no_indicators() {
        let report = risk_report("Hello shareholders.");
        assert!(report.contains("No significant risk indicators found in the document."));
    }
}
