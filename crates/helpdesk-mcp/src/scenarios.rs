//! Sample tickets used by the demo binary and the end-to-end tests
use helpdesk_core::TicketFields;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub fields: TicketFields,
}

fn ticket(customer: &str, email: &str, query: &str, priority: &str, id: &str) -> TicketFields {
    TicketFields {
        customer_name: customer.to_string(),
        email: email.to_string(),
        query: query.to_string(),
        priority: priority.to_string(),
        ticket_id: id.to_string(),
    }
}

pub fn sample_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "High Priority Delivery Issue",
            fields: ticket(
                "John Doe",
                "john.doe@example.com",
                "My order hasn't arrived yet and it's been over 10 days. I need urgent help!",
                "high",
                "TKT-2024-1001",
            ),
        },
        Scenario {
            name: "Medium Priority Login Issue",
            fields: ticket(
                "Jane Smith",
                "jane.smith@example.com",
                "I can't login to my account, it says invalid credentials when I try",
                "medium",
                "TKT-2024-1002",
            ),
        },
        Scenario {
            name: "Low Priority Information Request",
            fields: ticket(
                "Bob Wilson",
                "bob.wilson@example.com",
                "How do I reset my password for the customer portal?",
                "low",
                "TKT-2024-1003",
            ),
        },
    ]
}
