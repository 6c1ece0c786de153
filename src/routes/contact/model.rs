use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::LocaleSettings;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 254;
pub const COMPANY_MAX: usize = 100;
pub const PHONE_MAX: usize = 32;
pub const SUBJECT_MAX: usize = 200;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 5000;

/// 联系表单请求体；字段全部可选，缺失由校验报告
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    #[serde(alias = "cf-turnstile-response")]
    pub turnstile_token: Option<String>,
    pub locale: Option<String>,
    /// 蜜罐字段，正常用户不会填写
    pub website: Option<String>,
}

/// 通过校验的表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub turnstile_token: String,
    pub locale: Option<String>,
}

/// 校验失败的字段；`key` 用于查找翻译，`fallback` 为默认文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub key: &'static str,
    pub fallback: String,
}

impl Violation {
    fn new(field: &'static str, key: &'static str, fallback: impl Into<String>) -> Self {
        Self {
            field,
            key,
            fallback: fallback.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactReceipt {
    pub id: Uuid,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 邮箱格式的基本检查
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || local.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty()
                && !l.starts_with('-')
                && !l.ends_with('-')
                && l.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

fn is_valid_phone(phone: &str) -> bool {
    phone.chars().any(|c| c.is_ascii_digit())
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'))
}

impl ContactRequest {
    pub fn is_honeypot_filled(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }

    pub fn validate(self, locales: &LocaleSettings) -> Result<ValidContact, Vec<Violation>> {
        let mut violations = Vec::new();

        let name = trimmed(self.name);
        match &name {
            None => violations.push(Violation::new("name", "contact.validation.nameRequired", "Name is required")),
            Some(n) if !(NAME_MIN..=NAME_MAX).contains(&char_len(n)) => violations.push(Violation::new(
                "name",
                "contact.validation.nameLength",
                format!("Name must be between {} and {} characters", NAME_MIN, NAME_MAX),
            )),
            _ => {}
        }

        let email = trimmed(self.email).map(|e| e.to_lowercase());
        match &email {
            None => violations.push(Violation::new("email", "contact.validation.emailRequired", "Email is required")),
            Some(e) if char_len(e) > EMAIL_MAX || !is_valid_email(e) => violations.push(Violation::new(
                "email",
                "contact.validation.emailInvalid",
                "Please enter a valid email address",
            )),
            _ => {}
        }

        let company = trimmed(self.company);
        if company.as_deref().is_some_and(|c| char_len(c) > COMPANY_MAX) {
            violations.push(Violation::new(
                "company",
                "contact.validation.companyLength",
                format!("Company must be at most {} characters", COMPANY_MAX),
            ));
        }

        let phone = trimmed(self.phone);
        if phone
            .as_deref()
            .is_some_and(|p| char_len(p) > PHONE_MAX || !is_valid_phone(p))
        {
            violations.push(Violation::new(
                "phone",
                "contact.validation.phoneInvalid",
                "Please enter a valid phone number",
            ));
        }

        let subject = trimmed(self.subject);
        if subject.as_deref().is_some_and(|s| char_len(s) > SUBJECT_MAX) {
            violations.push(Violation::new(
                "subject",
                "contact.validation.subjectLength",
                format!("Subject must be at most {} characters", SUBJECT_MAX),
            ));
        }

        let message = trimmed(self.message);
        match &message {
            None => violations.push(Violation::new(
                "message",
                "contact.validation.messageRequired",
                "Message is required",
            )),
            Some(m) if !(MESSAGE_MIN..=MESSAGE_MAX).contains(&char_len(m)) => violations.push(Violation::new(
                "message",
                "contact.validation.messageLength",
                format!(
                    "Message must be between {} and {} characters",
                    MESSAGE_MIN, MESSAGE_MAX
                ),
            )),
            _ => {}
        }

        let turnstile_token = trimmed(self.turnstile_token);
        if turnstile_token.is_none() {
            violations.push(Violation::new(
                "turnstileToken",
                "contact.validation.captchaRequired",
                "Please complete the security check",
            ));
        }

        let locale = match trimmed(self.locale) {
            Some(l) if locales.is_supported(&l) => Some(crate::i18n::normalize(&l)),
            Some(_) => {
                violations.push(Violation::new(
                    "locale",
                    "contact.validation.localeUnsupported",
                    "Unsupported locale",
                ));
                None
            }
            None => None,
        };

        match (name, email, message, turnstile_token) {
            (Some(name), Some(email), Some(message), Some(turnstile_token))
                if violations.is_empty() =>
            {
                Ok(ValidContact {
                    name,
                    email,
                    company,
                    phone,
                    subject,
                    message,
                    turnstile_token,
                    locale,
                })
            }
            _ => Err(violations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> LocaleSettings {
        LocaleSettings::new("en", &["en".into(), "es".into()])
    }

    fn valid() -> ContactRequest {
        ContactRequest {
            name: Some("  Ada Lovelace ".into()),
            email: Some("Ada@Example.com".into()),
            message: Some("I would like to know more.".into()),
            turnstile_token: Some("token".into()),
            ..Default::default()
        }
    }

    fn fields(violations: &[Violation]) -> Vec<&'static str> {
        violations.iter().map(|v| v.field).collect()
    }

    #[test]
    fn valid_request_is_normalized() {
        let contact = valid().validate(&locales()).unwrap();
        assert_eq!(contact.name, "Ada Lovelace");
        assert_eq!(contact.email, "ada@example.com");
        assert!(contact.company.is_none());
    }

    #[test]
    fn empty_request_reports_required_fields() {
        let violations = ContactRequest::default().validate(&locales()).unwrap_err();
        assert_eq!(
            fields(&violations),
            vec!["name", "email", "message", "turnstileToken"]
        );
    }

    #[test]
    fn lengths_are_enforced() {
        let req = ContactRequest {
            name: Some("A".into()),
            message: Some("too short".into()),
            subject: Some("s".repeat(SUBJECT_MAX + 1)),
            company: Some("c".repeat(COMPANY_MAX + 1)),
            ..valid()
        };
        let violations = req.validate(&locales()).unwrap_err();
        assert_eq!(fields(&violations), vec!["name", "company", "subject", "message"]);
    }

    #[test]
    fn bad_email_phone_and_locale_are_rejected() {
        let req = ContactRequest {
            email: Some("not-an-email".into()),
            phone: Some("call me".into()),
            locale: Some("de".into()),
            ..valid()
        };
        let violations = req.validate(&locales()).unwrap_err();
        assert_eq!(fields(&violations), vec!["email", "phone", "locale"]);
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@-bad.com"));
        assert!(!is_valid_email("a@example..com"));
    }

    #[test]
    fn phone_rules() {
        assert!(is_valid_phone("+1 (555) 010-0000"));
        assert!(!is_valid_phone("()"));
    }

    #[test]
    fn honeypot_detection() {
        let mut req = valid();
        assert!(!req.is_honeypot_filled());
        req.website = Some("http://spam.example".into());
        assert!(req.is_honeypot_filled());
    }

    #[test]
    fn accepts_widget_field_name_for_token() {
        let req: ContactRequest =
            serde_json::from_str(r#"{"cf-turnstile-response":"abc"}"#).unwrap();
        assert_eq!(req.turnstile_token.as_deref(), Some("abc"));
    }
}
