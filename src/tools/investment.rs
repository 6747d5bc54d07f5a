//! Investment analyzer tool: pulls headline figures and risk wording out of
//! document text and renders a short guidance report.

use std::sync::LazyLock;

use regex::Regex;

struct MetricPattern {
    label: &'static str,
    regex: Regex,
}

struct IndicatorPattern {
    label: &'static str,
    regex: Regex,
}

fn metric(label: &'static str, pattern: &str) -> MetricPattern {
    MetricPattern {
        label,
        regex: Regex::new(pattern).expect("valid metric pattern"),
    }
}

fn indicator(label: &'static str, pattern: &str) -> IndicatorPattern {
    IndicatorPattern {
        label,
        regex: Regex::new(pattern).expect("valid indicator pattern"),
    }
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));

static METRIC_PATTERNS: LazyLock<Vec<MetricPattern>> = LazyLock::new(|| {
    vec![
        metric(
            "Revenue / Sales / Income",
            r"(?i)(?:revenue|sales|income)\s*[:$]?\s*([\d,]+\.?\d*)\s*(?:million|billion|thousand)?",
        ),
        metric(
            "Net Income / Profit / Earnings",
            r"(?i)(?:net\s*income|profit|earnings)\s*[:$]?\s*([\d,]+\.?\d*)\s*(?:million|billion|thousand)?",
        ),
        metric(
            "EBITDA / Operating Income",
            r"(?i)(?:EBITDA|operating\s*income)\s*[:$]?\s*([\d,]+\.?\d*)\s*(?:million|billion|thousand)?",
        ),
    ]
});

static RISK_INDICATORS: LazyLock<Vec<IndicatorPattern>> = LazyLock::new(|| {
    vec![
        indicator("Debt / Liability figures", r"(?i)(?:debt|liability)\s*[:$]?\s*([\d,]+\.?\d*)"),
        indicator("Risk / Volatility / Uncertainty language", r"(?i)(?:risk|volatility|uncertainty)"),
        indicator("Loss / Decline / Decrease language", r"(?i)(?:loss|decline|decrease)"),
    ]
});

/// Values captured for one metric family, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMatch {
    pub label: &'static str,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvestmentAnalysis {
    pub metrics: Vec<MetricMatch>,
    pub risk_indicators: Vec<&'static str>,
}

impl InvestmentAnalysis {
    pub fn has_risk_indicators(&self) -> bool {
        !self.risk_indicators.is_empty()
    }

    pub fn metric(&self, label: &str) -> Option<&MetricMatch> {
        self.metrics.iter().find(|m| m.label == label)
    }

    pub fn render(&self) -> String {
        let mut report = String::from("\n=== INVESTMENT ANALYSIS REPORT ===\n\n");

        if !self.metrics.is_empty() {
            report.push_str("**Financial Metrics Identified:**\n");
            for metric in &self.metrics {
                report.push_str(&format!("- {}: {}\n", metric.label, metric.values.join(", ")));
            }
            report.push('\n');
        }

        if self.has_risk_indicators() {
            report.push_str("**Risk Indicators Found:**\n");
            for risk in &self.risk_indicators {
                report.push_str(&format!("- {}\n", risk));
            }
            report.push('\n');
        }

        report.push_str("**Investment Recommendations:**\n");
        report.push_str("1. Conduct thorough due diligence before making any investment decisions\n");
        report.push_str("2. Consider diversification to mitigate risk\n");
        report.push_str("3. Consult with a qualified financial advisor\n");
        report.push_str("4. Review the complete financial documents for comprehensive analysis\n");
        report.push_str("5. Monitor market conditions and economic indicators\n");

        if self.has_risk_indicators() {
            report.push_str("\n**Risk Management Considerations:**\n");
            report.push_str("- Higher risk indicators suggest need for conservative approach\n");
            report.push_str("- Consider hedging strategies for risk mitigation\n");
            report.push_str("- Regular portfolio review and rebalancing recommended\n");
        }

        report
    }
}

pub fn analyze_investment(financial_document_data: &str) -> InvestmentAnalysis {
    let cleaned = WHITESPACE.replace_all(financial_document_data.trim(), " ");

    let metrics = METRIC_PATTERNS
        .iter()
        .filter_map(|pattern| {
            let values: Vec<String> = pattern
                .regex
                .captures_iter(&cleaned)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect();
            (!values.is_empty()).then(|| MetricMatch {
                label: pattern.label,
                values,
            })
        })
        .collect();

    let risk_indicators = RISK_INDICATORS
        .iter()
        .filter(|pattern| pattern.regex.is_match(&cleaned))
        .map(|pattern| pattern.label)
        .collect();

    InvestmentAnalysis {
        metrics,
        risk_indicators,
    }
}

/// Tool entry point.
pub fn investment_report(financial_document_data: &str) -> String {
    analyze_investment(financial_document_data).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Total revenue $1,200 million for the year.\n\
        Net income 300 million, EBITDA 450.5 billion.\n\
        Debt: 900 outstanding. Market volatility remains elevated.";

    #[test]
    fn test_extracts_metrics_case_insensitively() {
        let analysis = analyze_investment(SAMPLE);

        let revenue = analysis.metric("Revenue / Sales / Income").unwrap();
        assert!(revenue.values.contains(&"1,200".to_string()));

        let profit = analysis.metric("Net Income / Profit / Earnings").unwrap();
        assert_eq!(profit.values, vec!["300".to_string()]);

        let ebitda = analysis.metric("EBITDA / Operating Income").unwrap();
        assert_eq!(ebitda.values, vec!["450.5".to_string()]);
    }

    #[test]
    fn test_detects_risk_indicators() {
        let analysis = analyze_investment(SAMPLE);
        assert_eq!(
            analysis.risk_indicators,
            vec!["Debt / Liability figures", "Risk / Volatility / Uncertainty language"]
        );

        let report = analysis.render();
        assert!(report.contains("**Risk Indicators Found:**"));
        assert!(report.contains("**Risk Management Considerations:**"));
    }

    #[test]
    fn test_plain_text_still_gets_guidance() {
        let report = investment_report("A letter to shareholders with no figures.");
        assert!(report.starts_with("\n=== INVESTMENT ANALYSIS REPORT ==="));
        assert!(!report.contains("**Financial Metrics Identified:**"));
        assert!(!report.contains("**Risk Management Considerations:**"));
        assert!(report.contains("1. Conduct thorough due diligence"));
    }
}
