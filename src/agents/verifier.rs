//! Financial Document Verifier
//!
//! First step of the pipeline. Reads the upload, decides whether it is a
//! genuine financial document and cross-checks what it claims against the
//! web.

use super::{AgentSpec, TaskSpec};
use crate::tools::ToolKind;

pub fn agent() -> AgentSpec {
    AgentSpec {
        role: "Financial Document Verifier",
        goal: "Verify that uploaded documents are valid financial documents and ensure data integrity and compliance with financial standards",
        backstory: "You are a meticulous financial compliance specialist with expertise in document verification \
            and regulatory compliance. You carefully examine each document to ensure it meets financial \
            document standards, contains valid financial data, and follows proper formatting. \
            You verify data accuracy, check for inconsistencies, and ensure documents comply with \
            financial reporting regulations. Your attention to detail ensures only valid financial \
            documents proceed to analysis.",
        tools: vec![ToolKind::DocumentReader, ToolKind::WebSearch],
        allow_delegation: true,
        max_iter: 1,
        max_rpm: 1,
    }
}

pub fn task() -> TaskSpec {
    TaskSpec {
        description: "Verify that the uploaded document is a valid financial document and ensure data integrity.\n\
            Conduct thorough examination of document structure, content, and formatting.\n\
            Check for compliance with financial reporting standards and regulations.\n\
            Validate data accuracy and identify any inconsistencies or anomalies.\n\
            Provide detailed verification results with specific findings and recommendations.",
        expected_output: "Provide comprehensive document verification including:\n\
            - Document type classification and validation\n\
            - Assessment of data integrity and accuracy\n\
            - Identification of any formatting or structural issues\n\
            - Compliance check with financial reporting standards\n\
            - Detailed list of any anomalies or inconsistencies found\n\
            - Clear verification status (approved/rejected/requires review)\n\
            - Specific recommendations for addressing any identified issues",
        agent: agent(),
    }
}
