//! The `<providers>` list of the keycloak-server subsystem.
//!
//! The server configuration is edited as text: the document is scanned with
//! `quick-xml` to locate `<providers>` and a new `<provider>` line is spliced
//! in, leaving every other byte of the file untouched.

use std::fs;
use std::path::PathBuf;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{HskcError, Result};

use super::KeycloakHandle;

const SUBSYSTEM_NS_PREFIX: &str = "urn:jboss:domain:keycloak-server:";

/// Where a new provider goes.
enum Insertion {
    /// Before `</providers>`, with the indentation of that closing tag.
    BeforeClose { at: usize, indent: String },
    /// Replace a self-closing `<providers/>` spanning `start..end`.
    ExpandEmpty {
        start: usize,
        end: usize,
        indent: String,
    },
}

struct ProvidersScan {
    values: Vec<String>,
    insertion: Insertion,
}

fn config_err(message: impl Into<String>) -> HskcError {
    HskcError::ServerConfig {
        path: PathBuf::new(),
        message: message.into(),
    }
}

fn is_keycloak_subsystem(e: &BytesStart<'_>) -> bool {
    if e.local_name().as_ref() != b"subsystem" {
        return false;
    }
    e.attributes().flatten().any(|attr| {
        attr.key.as_ref() == b"xmlns"
            && String::from_utf8_lossy(&attr.value).starts_with(SUBSYSTEM_NS_PREFIX)
    })
}

/// Whitespace between the start of the line and `at`, or empty if the line
/// holds anything else before it.
fn line_indent(xml: &str, at: usize) -> String {
    let line_start = xml[..at].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &xml[line_start..at];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix.to_string()
    } else {
        String::new()
    }
}

fn scan(xml: &str) -> Result<ProvidersScan> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut subsystem_depth: Option<usize> = None;
    let mut in_providers = false;
    let mut provider_text: Option<String> = None;
    let mut values = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| config_err(format!("invalid XML: {}", e)))?;

        match event {
            Event::Start(e) => {
                depth += 1;
                match subsystem_depth {
                    None if is_keycloak_subsystem(&e) => subsystem_depth = Some(depth),
                    Some(sd) if depth == sd + 1 && e.local_name().as_ref() == b"providers" => {
                        in_providers = true;
                    }
                    Some(sd)
                        if in_providers
                            && depth == sd + 2
                            && e.local_name().as_ref() == b"provider" =>
                    {
                        provider_text = Some(String::new());
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match subsystem_depth {
                Some(sd) if depth == sd && e.local_name().as_ref() == b"providers" => {
                    return Ok(ProvidersScan {
                        values,
                        insertion: Insertion::ExpandEmpty {
                            start: before,
                            end: reader.buffer_position() as usize,
                            indent: line_indent(xml, before),
                        },
                    });
                }
                None if is_keycloak_subsystem(&e) => {
                    return Err(config_err("keycloak-server subsystem has no <providers>"));
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(text) = provider_text.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(t) => {
                if let Some(text) = provider_text.as_mut() {
                    let raw = String::from_utf8_lossy(&t);
                    text.push_str(&escape(&*raw));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(text) = provider_text.as_mut() {
                    text.push('&');
                    text.push_str(&String::from_utf8_lossy(&r));
                    text.push(';');
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                match subsystem_depth {
                    Some(sd) if in_providers && depth == sd + 2 && name.as_ref() == b"provider" => {
                        if let Some(raw) = provider_text.take() {
                            let value = unescape(&raw)
                                .map(|v| v.into_owned())
                                .unwrap_or(raw);
                            values.push(value.trim().to_string());
                        }
                    }
                    Some(sd) if in_providers && depth == sd + 1 && name.as_ref() == b"providers" => {
                        return Ok(ProvidersScan {
                            values,
                            insertion: Insertion::BeforeClose {
                                at: before,
                                indent: line_indent(xml, before),
                            },
                        });
                    }
                    Some(sd) if depth == sd => {
                        return Err(config_err("keycloak-server subsystem has no <providers>"));
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(config_err("no keycloak-server subsystem found"))
}

/// Every `<provider>` value of the keycloak-server subsystem, trimmed.
pub fn read_providers(xml: &str) -> Result<Vec<String>> {
    Ok(scan(xml)?.values)
}

/// Return `xml` with `value` appended to the providers list.
///
/// The new element is indented one level deeper than `</providers>`.
pub fn add_provider(xml: &str, value: &str) -> Result<String> {
    let scanned = scan(xml)?;
    let element = format!("<provider>{}</provider>", escape(value));

    let mut out = String::with_capacity(xml.len() + element.len() + 32);
    match scanned.insertion {
        Insertion::BeforeClose { at, indent } => {
            out.push_str(&xml[..at]);
            if indent.is_empty() {
                out.push_str(&element);
            } else {
                out.push_str("    ");
                out.push_str(&element);
                out.push('\n');
                out.push_str(&indent);
            }
            out.push_str(&xml[at..]);
        }
        Insertion::ExpandEmpty { start, end, indent } => {
            out.push_str(&xml[..start]);
            out.push_str("<providers>\n");
            out.push_str(&indent);
            out.push_str("    ");
            out.push_str(&element);
            out.push('\n');
            out.push_str(&indent);
            out.push_str("</providers>");
            out.push_str(&xml[end..]);
        }
    }
    Ok(out)
}

impl KeycloakHandle {
    /// `${KCBASE}/standalone/configuration/<mode>.xml`.
    pub fn config_path(&self) -> PathBuf {
        self.kcbase
            .join("standalone")
            .join("configuration")
            .join(format!("{}.xml", self.mode))
    }

    fn read_config(&self) -> Result<String> {
        let path = self.config_path();
        fs::read_to_string(&path).map_err(|e| HskcError::ServerConfig {
            path,
            message: e.to_string(),
        })
    }

    fn with_path(&self, err: HskcError) -> HskcError {
        match err {
            HskcError::ServerConfig { message, .. } => HskcError::ServerConfig {
                path: self.config_path(),
                message,
            },
            other => other,
        }
    }

    /// Providers configured for the keycloak-server subsystem.
    pub fn providers(&self) -> Result<Vec<String>> {
        let xml = self.read_config()?;
        read_providers(&xml).map_err(|e| self.with_path(e))
    }

    pub fn is_module_registered(&self, module_name: &str) -> Result<bool> {
        let wanted = format!("module:{}", module_name);
        Ok(self.providers()?.iter().any(|p| *p == wanted))
    }

    /// Add `module:<name>` to the providers list.
    ///
    /// Returns `false` without touching the file when it is already there.
    /// Keycloak rewrites this file on shutdown, so call it while stopped.
    pub fn register_module(&self, module_name: &str) -> Result<bool> {
        if self.is_module_registered(module_name)? {
            tracing::info!("Module {} is already registered!", module_name);
            return Ok(false);
        }

        let xml = self.read_config()?;
        let updated = add_provider(&xml, &format!("module:{}", module_name))
            .map_err(|e| self.with_path(e))?;
        fs::write(self.config_path(), updated)?;
        tracing::info!("Module {} registered in keycloak!", module_name);
        Ok(true)
    }
}
