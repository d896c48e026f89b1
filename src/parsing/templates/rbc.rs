//! RBC Royal Bank notification templates.
//!
//! Every notification type is its own descriptor: subject + body phrases,
//! the field-pattern table, and the constants the builder needs. RBC sends
//! amounts as `$1,234.56` and dates as `June 1, 2025`.

use anyhow::Result;

use crate::domain::Direction;
use crate::parsing::extract::FieldPattern;
use crate::parsing::{DescriptionRule, TemplateParser};

const BODY_PHRASE: &str = "RBC Royal Bank";
const INSTITUTION: &str = "rbc";
const CURRENCY: &str = "CAD";

pub fn parsers() -> Result<Vec<TemplateParser>> {
    Ok(vec![
        purchase()?,
        deposit()?,
        withdrawal()?,
        payment()?,
        credit()?,
    ])
}

fn purchase() -> Result<TemplateParser> {
    Ok(TemplateParser {
        name: "rbc-purchase",
        subject_phrase: "You made a purchase",
        body_phrase: BODY_PHRASE,
        institution: INSTITUTION,
        currency: CURRENCY,
        direction: Direction::Out,
        description: DescriptionRule::Field("desc"),
        fields: vec![
            FieldPattern::optional("account", r"(\*{12}\d+|\*+\d+)")?,
            FieldPattern::required("amount", r"\$(\d+\.\d{2})")?,
            FieldPattern::required("txdate", r"([A-Za-z]+ \d{1,2}, \d{4})")?,
            FieldPattern::required("desc", r"towards ([^.]+)\.")?,
        ],
    })
}

fn deposit() -> Result<TemplateParser> {
    Ok(TemplateParser {
        name: "rbc-deposit",
        subject_phrase: "Deposit Notice",
        body_phrase: BODY_PHRASE,
        institution: INSTITUTION,
        currency: CURRENCY,
        direction: Direction::In,
        description: DescriptionRule::Label("RBC Deposit"),
        fields: vec![
            FieldPattern::optional("account", r"Account:[ \t]*\n?[ \t]*([A-Za-z0-9 ]+)")?,
            FieldPattern::required("amount", r"Deposit Amount:\s*\$([\d,]+\.\d{2})")?,
            FieldPattern::required("txdate", r"Transaction Date:\s*([A-Za-z]+ \d{1,2}, \d{4})")?,
        ],
    })
}

fn withdrawal() -> Result<TemplateParser> {
    Ok(TemplateParser {
        name: "rbc-withdrawal",
        subject_phrase: "Withdrawal Warning",
        body_phrase: BODY_PHRASE,
        institution: INSTITUTION,
        currency: CURRENCY,
        direction: Direction::Out,
        description: DescriptionRule::Label("RBC Withdrawal"),
        fields: vec![
            FieldPattern::optional("account", r"Account:[ \t]*\n?[ \t]*([A-Za-z0-9 ]+)")?,
            FieldPattern::required("amount", r"Withdrawal Amount:\s*\$([\d,]+\.\d{2})")?,
            FieldPattern::required("txdate", r"Transaction Date:\s*([A-Za-z]+ \d{1,2}, \d{4})")?,
        ],
    })
}

fn payment() -> Result<TemplateParser> {
    Ok(TemplateParser {
        name: "rbc-payment",
        subject_phrase: "Payment Made",
        body_phrase: BODY_PHRASE,
        institution: INSTITUTION,
        currency: CURRENCY,
        direction: Direction::In,
        description: DescriptionRule::Label("RBC Payment"),
        fields: vec![
            FieldPattern::optional("account", r"(?s)Account:.*?(\*+\d+)")?,
            FieldPattern::required("amount", r"(?s)Payment Amount:.*?\$\s*([\d,]+\.\d{2})")?,
            FieldPattern::required(
                "txdate",
                r"(?s)Transaction Date:.*?([A-Za-z]+\s+\d{1,2},\s+\d{4})",
            )?,
        ],
    })
}

fn credit() -> Result<TemplateParser> {
    Ok(TemplateParser {
        name: "rbc-credit",
        subject_phrase: "You received a credit.",
        body_phrase: BODY_PHRASE,
        institution: INSTITUTION,
        currency: CURRENCY,
        direction: Direction::In,
        description: DescriptionRule::Field("desc"),
        fields: vec![
            FieldPattern::optional("account", r"Account:\s*(\*+\d+)")?,
            FieldPattern::required("amount", r"Purchase Amount:\s*\$([\d,]+\.\d{2})")?,
            FieldPattern::required("txdate", r"Transaction Date:\s*([A-Za-z]+ \d{1,2}, \d{4})")?,
            FieldPattern::required("desc", r"Transaction Description:\s*(.+)")?,
        ],
    })
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use crate::domain::{Direction, Transaction};
    use crate::email::EmailMeta;
    use crate::parsing::{build_registry, find};

    struct Expected {
        parser: &'static str,
        account: &'static str,
        amount: &'static str,
        date: (i32, u32, u32),
        direction: Direction,
        description: &'static str,
    }

    fn assert_parsed(meta: &EmailMeta, expected: &Expected) -> Transaction {
        let registry = build_registry().expect("registry");
        let parser = find(&registry, meta)
            .unwrap_or_else(|| panic!("no parser matched subject {:?}", meta.subject));
        assert_eq!(parser.name, expected.parser);

        let tx = parser.parse(meta).expect("parse");
        assert_eq!(tx.institution, "rbc");
        assert_eq!(tx.currency, "CAD");
        assert_eq!(tx.account_label, expected.account);
        assert_eq!(tx.amount, expected.amount);
        assert_eq!(tx.direction, expected.direction);
        assert_eq!(tx.description, expected.description);
        assert_eq!(tx.category, "");
        assert_eq!(tx.account_id, None);

        let (y, m, d) = expected.date;
        assert_eq!(tx.tx_date, Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap());

        tx
    }

    fn meta(subject: &str, text: &str) -> EmailMeta {
        EmailMeta {
            id: "test-id".to_owned(),
            subject: subject.to_owned(),
            text: text.to_owned(),
            // a different calendar day, so tx_date comes from the body
            date: "2025-07-15T10:00:00Z".to_owned(),
        }
    }

    const PURCHASE_BODY: &str = "RBC Royal Bank\n\
        Account: ************0000\n\
        Purchase Amount: $26.19\n\
        Transaction Date: June 1, 2025\n\
        This purchase was made towards UBER EATS.\n";

    #[test]
    fn purchase_notification() {
        assert_parsed(
            &meta("You made a purchase of $26.19", PURCHASE_BODY),
            &Expected {
                parser: "rbc-purchase",
                account: "************0000",
                amount: "26.19",
                date: (2025, 6, 1),
                direction: Direction::Out,
                description: "UBER EATS",
            },
        );
    }

    #[test]
    fn forwarded_purchase_parses_identically() {
        use crate::email::decode;

        let original = format!(
            "Subject: You made a purchase of $26.19\r\n\
             Date: Sun, 1 Jun 2025 09:30:00 -0400\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             {}",
            PURCHASE_BODY.replace('\n', "\r\n")
        );
        let forwarded_body = format!(
            "FYI, see below\r\n\
             \r\n\
             > Begin forwarded message:\r\n\
             {}",
            PURCHASE_BODY
                .lines()
                .map(|l| format!("> {l}\r\n"))
                .collect::<String>()
        );
        let forwarded = format!(
            "Subject: Fwd: You made a purchase of $26.19\r\n\
             Date: Tue, 3 Jun 2025 08:00:00 -0400\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             {forwarded_body}"
        );

        let registry = build_registry().expect("registry");

        let original = decode(original.as_bytes()).expect("decode original");
        let forwarded = decode(forwarded.as_bytes()).expect("decode forwarded");

        let original_meta = EmailMeta {
            id: "orig".to_owned(),
            subject: original.subject,
            text: original.text,
            date: original.date,
        };
        let forwarded_meta = EmailMeta {
            id: "fwd".to_owned(),
            subject: forwarded.subject,
            text: forwarded.text,
            date: forwarded.date,
        };

        let p1 = find(&registry, &original_meta).expect("original match");
        let p2 = find(&registry, &forwarded_meta).expect("forwarded match");
        assert_eq!(p1.name, p2.name);

        let tx1 = p1.parse(&original_meta).expect("parse original");
        let tx2 = p2.parse(&forwarded_meta).expect("parse forwarded");

        assert_eq!(tx1.account_label, tx2.account_label);
        assert_eq!(tx1.amount, tx2.amount);
        assert_eq!(tx1.description, tx2.description);
        assert_eq!(tx1.direction, tx2.direction);
        // the forward arrived days later, so its tx_date falls back to the
        // body date at midnight while the original keeps its receive time
        assert_eq!(tx2.tx_date.to_rfc3339(), "2025-06-01T00:00:00+00:00");
        assert_eq!(tx1.tx_date.to_rfc3339(), "2025-06-01T13:30:00+00:00");
    }

    #[test]
    fn deposit_notification() {
        let body = "RBC Royal Bank\n\
            Account: Chequing 4567\n\
            Deposit Amount: $1,000.00\n\
            Transaction Date: May 30, 2025\n";

        assert_parsed(
            &meta("Deposit Notice", body),
            &Expected {
                parser: "rbc-deposit",
                account: "Chequing 4567",
                amount: "1000.00",
                date: (2025, 5, 30),
                direction: Direction::In,
                description: "RBC Deposit",
            },
        );
    }

    #[test]
    fn withdrawal_notification() {
        let body = "RBC Royal Bank\n\
            Account: Savings 8910\n\
            Withdrawal Amount: $250.00\n\
            Transaction Date: May 28, 2025\n";

        assert_parsed(
            &meta("Withdrawal Warning", body),
            &Expected {
                parser: "rbc-withdrawal",
                account: "Savings 8910",
                amount: "250.00",
                date: (2025, 5, 28),
                direction: Direction::Out,
                description: "RBC Withdrawal",
            },
        );
    }

    #[test]
    fn payment_notification() {
        let body = "RBC Royal Bank\n\
            Account:\n\
            ****1111\n\
            Payment Amount:\n\
            $ 2,500.00\n\
            Transaction Date:\n\
            June 2, 2025\n";

        assert_parsed(
            &meta("Payment Made", body),
            &Expected {
                parser: "rbc-payment",
                account: "****1111",
                amount: "2500.00",
                date: (2025, 6, 2),
                direction: Direction::In,
                description: "RBC Payment",
            },
        );
    }

    #[test]
    fn credit_notification() {
        let body = "RBC Royal Bank\n\
            Account: ****2222\n\
            Purchase Amount: $42.00\n\
            Transaction Date: June 3, 2025\n\
            Transaction Description: REFUND ACME STORE\n";

        assert_parsed(
            &meta("You received a credit.", body),
            &Expected {
                parser: "rbc-credit",
                account: "****2222",
                amount: "42.00",
                date: (2025, 6, 3),
                direction: Direction::In,
                description: "REFUND ACME STORE",
            },
        );
    }

    #[test]
    fn purchase_without_account_yields_empty_label() {
        let body = "RBC Royal Bank\n\
            Purchase Amount: $26.19\n\
            Transaction Date: June 1, 2025\n\
            This purchase was made towards UBER EATS.\n";

        assert_parsed(
            &meta("You made a purchase of $26.19", body),
            &Expected {
                parser: "rbc-purchase",
                account: "",
                amount: "26.19",
                date: (2025, 6, 1),
                direction: Direction::Out,
                description: "UBER EATS",
            },
        );
    }

    #[test]
    fn purchase_missing_merchant_fails_extraction() {
        let registry = build_registry().expect("registry");
        let body = "RBC Royal Bank\n\
            Account: ****0000\n\
            Purchase Amount: $26.19\n\
            Transaction Date: June 1, 2025\n";
        let meta = meta("You made a purchase of $26.19", body);

        let parser = find(&registry, &meta).expect("match");
        let err = parser.parse(&meta).expect_err("should fail");
        assert!(matches!(
            err,
            crate::error::IngestError::FieldNotFound("desc")
        ));
    }
}
