//! Connection variable substitution
//!
//! Orchestrator scripts ask for strings with `{field}` placeholders
//! resolved against the connection a terminal was opened for, plus the
//! dynamically allocated proxy port when one exists. Unknown
//! placeholders are left untouched.

use crate::models::Connection;

/// Replaces `{field}` placeholders in `input` with values from the
/// connection. Recognized fields: `name`, `host`, `port`, `user`,
/// `folder`, `type`, and `proxy_port` (when allocated).
#[must_use]
pub fn substitute(input: &str, connection: &Connection, proxy_port: Option<u16>) -> String {
    let port = connection
        .effective_port()
        .map_or_else(String::new, |p| p.to_string());

    let mut result = input.to_string();
    let fields: [(&str, &str); 6] = [
        ("{name}", &connection.name),
        ("{host}", &connection.host),
        ("{port}", &port),
        ("{user}", &connection.user),
        ("{folder}", &connection.folder),
        ("{type}", connection.kind.as_str()),
    ];
    for (pattern, value) in fields {
        result = result.replace(pattern, value);
    }
    if let Some(proxy) = proxy_port {
        result = result.replace("{proxy_port}", &proxy.to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionKind;

    fn conn() -> Connection {
        let mut c = Connection::ssh("web01", "web01.example.com");
        c.user = "deploy".to_string();
        c
    }

    #[test]
    fn substitutes_connection_fields() {
        let out = substitute("ssh {user}@{host} -p {port}", &conn(), None);
        assert_eq!(out, "ssh deploy@web01.example.com -p 22");
    }

    #[test]
    fn substitutes_proxy_port_when_allocated() {
        let out = substitute("curl -x localhost:{proxy_port}", &conn(), Some(50022));
        assert_eq!(out, "curl -x localhost:50022");
    }

    #[test]
    fn proxy_port_placeholder_survives_when_unallocated() {
        let out = substitute("{proxy_port}", &conn(), None);
        assert_eq!(out, "{proxy_port}");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let out = substitute("{name} {password}", &conn(), None);
        assert_eq!(out, "web01 {password}");
    }

    #[test]
    fn type_field_uses_lowercase_kind() {
        let c = conn().clone_as(ConnectionKind::Sftp);
        assert_eq!(substitute("{type}", &c, None), "sftp");
    }
}
