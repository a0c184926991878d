//! Check templates and their protocol-specific definitions.
//!
//! A template is stored and transferred as
//! `{ id, title, description, protocol, definition }`. The `protocol` tag
//! selects the definition schema; unknown protocols and unknown definition
//! fields are rejected when the JSON is parsed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A reusable check configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TemplateWire")]
pub struct Template {
    /// Unique template id. Assigned by the server when copying.
    pub id: String,
    /// Short human-readable title.
    pub title: String,
    /// Longer explanation shown in the template table.
    pub description: String,
    /// Protocol and its definition.
    #[serde(flatten)]
    pub check: CheckDefinition,
}

/// Strict parse of the stored and transferred template shape.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateWire {
    #[serde(default)]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    protocol: String,
    definition: Value,
}

impl TryFrom<TemplateWire> for Template {
    type Error = serde_json::Error;

    fn try_from(wire: TemplateWire) -> Result<Self, Self::Error> {
        let check = serde_json::from_value(json!({
            "protocol": wire.protocol,
            "definition": wire.definition,
        }))?;

        Ok(Template {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            check,
        })
    }
}

impl Template {
    /// Name of the template's protocol.
    pub fn protocol(&self) -> &'static str {
        self.check.protocol()
    }

    /// Check constraints the type system does not express.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Template id must not be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("Template title must not be empty".to_string());
        }
        self.check.validate()
    }
}

/// Protocol-tagged check definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", content = "definition", rename_all = "lowercase")]
pub enum CheckDefinition {
    Dns(DnsDefinition),
    Ftp(FtpDefinition),
    Http(HttpDefinition),
    Icmp(IcmpDefinition),
    Imap(ImapDefinition),
    Ldap(LdapDefinition),
    Mysql(MysqlDefinition),
    Noop(NoopDefinition),
    Smb(SmbDefinition),
    Smtp(SmtpDefinition),
    Ssh(SshDefinition),
    Vnc(VncDefinition),
    Winrm(WinrmDefinition),
    Xmpp(XmppDefinition),
}

impl CheckDefinition {
    pub fn protocol(&self) -> &'static str {
        match self {
            CheckDefinition::Dns(_) => "dns",
            CheckDefinition::Ftp(_) => "ftp",
            CheckDefinition::Http(_) => "http",
            CheckDefinition::Icmp(_) => "icmp",
            CheckDefinition::Imap(_) => "imap",
            CheckDefinition::Ldap(_) => "ldap",
            CheckDefinition::Mysql(_) => "mysql",
            CheckDefinition::Noop(_) => "noop",
            CheckDefinition::Smb(_) => "smb",
            CheckDefinition::Smtp(_) => "smtp",
            CheckDefinition::Ssh(_) => "ssh",
            CheckDefinition::Vnc(_) => "vnc",
            CheckDefinition::Winrm(_) => "winrm",
            CheckDefinition::Xmpp(_) => "xmpp",
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            CheckDefinition::Http(http) => {
                if http.requests.is_empty() {
                    return Err("HTTP definition needs at least one request".to_string());
                }
                Ok(())
            }
            CheckDefinition::Icmp(icmp) if icmp.count == 0 => {
                Err("ICMP count must be at least 1".to_string())
            }
            CheckDefinition::Ssh(ssh) if ssh.password.is_none() && ssh.private_key.is_none() => {
                Err("SSH definition needs a password or a private key".to_string())
            }
            _ => Ok(()),
        }
    }
}

fn default_content_regex() -> String {
    ".*".to_string()
}

fn default_true() -> bool {
    true
}

fn port(value: &str) -> String {
    value.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsDefinition {
    /// DNS server to query.
    pub server: String,
    /// Name to resolve.
    pub fqdn: String,
    /// Address the name must resolve to.
    pub expected_ip: String,
    #[serde(default = "DnsDefinition::default_port")]
    pub port: String,
}

impl DnsDefinition {
    fn default_port() -> String {
        port("53")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FtpDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    /// File to retrieve.
    pub file: String,
    #[serde(default = "default_content_regex")]
    pub content_regex: String,
    /// Expected SHA3-256 digest of the file, if hashing is wanted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default = "FtpDefinition::default_port")]
    pub port: String,
}

impl FtpDefinition {
    fn default_port() -> String {
        port("21")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpDefinition {
    /// Validate HTTPS certificates.
    #[serde(default)]
    pub verify: bool,
    /// Return the matched content in the check result.
    #[serde(default)]
    pub report_matched_content: bool,
    /// Requests issued in order; all must pass.
    pub requests: Vec<HttpRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpRequest {
    pub host: String,
    pub path: String,
    #[serde(default)]
    pub https: bool,
    #[serde(default = "HttpRequest::default_port")]
    pub port: u16,
    #[serde(default = "HttpRequest::default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub match_code: bool,
    #[serde(default = "HttpRequest::default_code")]
    pub code: u16,
    #[serde(default)]
    pub match_content: bool,
    #[serde(default = "default_content_regex")]
    pub content_regex: String,
    /// Keep the matched content for use by a later request.
    #[serde(default)]
    pub store_value: bool,
}

impl HttpRequest {
    fn default_port() -> u16 {
        80
    }

    fn default_method() -> String {
        "GET".to_string()
    }

    fn default_code() -> u16 {
        200
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IcmpDefinition {
    pub host: String,
    /// Echo requests per check run.
    #[serde(default = "IcmpDefinition::default_count")]
    pub count: u32,
}

impl IcmpDefinition {
    fn default_count() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImapDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default = "ImapDefinition::default_port")]
    pub port: String,
}

impl ImapDefinition {
    fn default_port() -> String {
        port("143")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapDefinition {
    /// Bind user in DN syntax.
    pub user: String,
    pub password: String,
    pub fqdn: String,
    #[serde(default)]
    pub ldaps: bool,
    #[serde(default = "LdapDefinition::default_port")]
    pub port: String,
}

impl LdapDefinition {
    fn default_port() -> String {
        port("389")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MysqlDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub match_content: bool,
    #[serde(default = "default_content_regex")]
    pub content_regex: String,
    #[serde(default = "MysqlDefinition::default_port")]
    pub port: String,
}

impl MysqlDefinition {
    fn default_port() -> String {
        port("3306")
    }
}

/// Check that always passes; used to exercise attribute templating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoopDefinition {
    /// Text containing attribute references.
    pub dynamic: String,
    /// Text without attribute references.
    #[serde(rename = "static")]
    pub static_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmbDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    pub share: String,
    pub domain: String,
    pub file: String,
    #[serde(default = "default_content_regex")]
    pub content_regex: String,
    #[serde(default = "SmbDefinition::default_port")]
    pub port: String,
}

impl SmbDefinition {
    fn default_port() -> String {
        port("445")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default = "SmtpDefinition::default_body")]
    pub body: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default = "SmtpDefinition::default_port")]
    pub port: String,
}

impl SmtpDefinition {
    fn default_body() -> String {
        "Hello from ScoreStack".to_string()
    }

    fn default_port() -> String {
        port("25")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshDefinition {
    pub host: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Command run once logged in.
    pub cmd: String,
    #[serde(default)]
    pub match_content: bool,
    #[serde(default = "default_content_regex")]
    pub content_regex: String,
    #[serde(default = "SshDefinition::default_port")]
    pub port: String,
}

impl SshDefinition {
    fn default_port() -> String {
        port("22")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VncDefinition {
    pub host: String,
    pub port: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WinrmDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    pub cmd: String,
    #[serde(default = "default_true")]
    pub encrypted: bool,
    #[serde(default)]
    pub match_content: bool,
    #[serde(default = "default_content_regex")]
    pub content_regex: String,
    #[serde(default = "WinrmDefinition::default_port")]
    pub port: String,
}

impl WinrmDefinition {
    fn default_port() -> String {
        port("5986")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmppDefinition {
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub encrypted: bool,
    #[serde(default = "XmppDefinition::default_port")]
    pub port: String,
}

impl XmppDefinition {
    fn default_port() -> String {
        port("5222")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dns_template_with_defaults() {
        let template: Template = serde_json::from_value(json!({
            "id": "dns-basic",
            "title": "DNS lookup",
            "description": "Resolve the web server",
            "protocol": "dns",
            "definition": {
                "server": "10.0.0.53",
                "fqdn": "www.team.local",
                "expected_ip": "10.0.0.80"
            }
        }))
        .unwrap();

        assert_eq!(template.protocol(), "dns");
        match &template.check {
            CheckDefinition::Dns(dns) => assert_eq!(dns.port, "53"),
            other => panic!("expected dns, got {:?}", other),
        }
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_parse_http_request_defaults() {
        let template: Template = serde_json::from_value(json!({
            "id": "web",
            "title": "Web",
            "protocol": "http",
            "definition": {
                "requests": [{ "host": "10.0.0.80", "path": "/" }]
            }
        }))
        .unwrap();

        let CheckDefinition::Http(http) = &template.check else {
            panic!("expected http");
        };
        assert_eq!(http.requests[0].port, 80);
        assert_eq!(http.requests[0].method, "GET");
        assert_eq!(http.requests[0].code, 200);
        assert_eq!(http.requests[0].content_regex, ".*");
        assert!(template.description.is_empty());
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let result = serde_json::from_value::<Template>(json!({
            "id": "x",
            "title": "Gopher",
            "protocol": "gopher",
            "definition": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_definition_field_rejected() {
        let result = serde_json::from_value::<Template>(json!({
            "id": "x",
            "title": "VNC",
            "protocol": "vnc",
            "definition": { "host": "h", "port": "5900", "password": "p", "extra": 1 }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let result = serde_json::from_value::<Template>(json!({
            "id": "x",
            "title": "ICMP",
            "protocol": "icmp",
            "definition": { "host": "h" },
            "bogus": 1
        }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("bogus"), "{}", err);
    }

    #[test]
    fn test_missing_definition_rejected() {
        let result = serde_json::from_value::<Template>(json!({
            "id": "x",
            "title": "ICMP",
            "protocol": "icmp"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialized_shape_round_trips() {
        let input = json!({
            "id": "ping",
            "title": "Ping",
            "description": "",
            "protocol": "icmp",
            "definition": { "host": "10.0.0.1", "count": 2 }
        });
        let template: Template = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(serde_json::to_value(&template).unwrap(), input);
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result = serde_json::from_value::<Template>(json!({
            "id": "x",
            "title": "ICMP",
            "protocol": "icmp",
            "definition": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_noop_static_field_name() {
        let template: Template = serde_json::from_value(json!({
            "id": "noop",
            "title": "Noop",
            "protocol": "noop",
            "definition": { "dynamic": "{{.Value}}", "static": "fixed" }
        }))
        .unwrap();

        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["protocol"], "noop");
        assert_eq!(value["definition"]["static"], "fixed");
    }

    #[test]
    fn test_validate_rules() {
        let ssh: Template = serde_json::from_value(json!({
            "id": "ssh",
            "title": "SSH",
            "protocol": "ssh",
            "definition": { "host": "h", "username": "root", "cmd": "id" }
        }))
        .unwrap();
        assert!(ssh.validate().is_err());

        let http: Template = serde_json::from_value(json!({
            "id": "web",
            "title": "Web",
            "protocol": "http",
            "definition": { "requests": [] }
        }))
        .unwrap();
        assert!(http.validate().is_err());

        let mut icmp: Template = serde_json::from_value(json!({
            "id": "ping",
            "title": "Ping",
            "protocol": "icmp",
            "definition": { "host": "10.0.0.1" }
        }))
        .unwrap();
        assert!(icmp.validate().is_ok());
        icmp.title = "  ".to_string();
        assert!(icmp.validate().is_err());
    }
}
