//! RPC proxy structs.
//!
//! For an interface `IFoo` the renderer emits `IFooStruct`, whose
//! `Internal` field holds one function-typed field per method tagged with
//! the method's permission, followed by one forwarding method per interface
//! member. Embedded interfaces become embedded `...Struct` fields.

use super::write_header;
use crate::error::{Error, Result};
use crate::source::{Field, ImportSpec, InterfaceType, Method};
use std::fmt::Write as FmtWrite;

/// Suffix appended to an interface name to name its proxy struct
pub const PROXY_SUFFIX: &str = "Struct";

/// An interface to render, by name
#[derive(Debug, Clone)]
pub struct ProxyInterface {
    /// Interface name
    pub name: String,
    /// Methods and embeds
    pub iface: InterfaceType,
}

/// Renders proxy structs for a list of interfaces
#[derive(Debug)]
pub struct ProxyRenderer<'a> {
    generator: &'a str,
    package: &'a str,
    imports: &'a [ImportSpec],
    interfaces: &'a [ProxyInterface],
}

impl<'a> ProxyRenderer<'a> {
    /// Creates a renderer; interfaces are emitted in the order given
    pub fn new(
        generator: &'a str,
        package: &'a str,
        imports: &'a [ImportSpec],
        interfaces: &'a [ProxyInterface],
    ) -> Self {
        Self {
            generator,
            package,
            imports,
            interfaces,
        }
    }

    /// Renders to a string.
    ///
    /// Fails if any method lacks a permission tag.
    pub fn render(&self) -> Result<String> {
        for proxy in self.interfaces {
            if let Some(method) = proxy.iface.methods.iter().find(|m| m.perm.is_none()) {
                return Err(Error::MissingPermission {
                    interface: proxy.name.clone(),
                    method: method.name.clone(),
                });
            }
        }
        let mut output = String::new();
        self.write_to(&mut output)
            .map_err(|_| Error::internal("failed to render proxy structs"))?;
        Ok(output)
    }

    fn write_to(&self, w: &mut impl FmtWrite) -> std::fmt::Result {
        write_header(w, self.generator, self.package)?;

        if !self.imports.is_empty() {
            writeln!(w, "import (")?;
            for import in self.imports {
                match &import.name {
                    Some(name) => writeln!(w, "\t{} \"{}\"", name, import.path)?,
                    None => writeln!(w, "\t\"{}\"", import.path)?,
                }
            }
            writeln!(w, ")")?;
            writeln!(w)?;
        }

        for proxy in self.interfaces {
            self.write_interface(w, proxy)?;
        }
        Ok(())
    }

    fn write_interface(&self, w: &mut impl FmtWrite, proxy: &ProxyInterface) -> std::fmt::Result {
        let struct_name = format!("{}{}", proxy.name, PROXY_SUFFIX);
        let mut methods: Vec<&Method> = proxy.iface.methods.iter().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));

        writeln!(w, "type {} struct {{", struct_name)?;
        for embed in &proxy.iface.embeds {
            writeln!(w, "\t{}{}", embed, PROXY_SUFFIX)?;
        }
        if !methods.is_empty() {
            if !proxy.iface.embeds.is_empty() {
                writeln!(w)?;
            }
            self.write_internal(w, &methods)?;
        }
        writeln!(w, "}}")?;
        writeln!(w)?;

        if methods.is_empty() {
            return Ok(());
        }
        for method in &methods {
            write_forwarder(w, &struct_name, method)?;
        }
        writeln!(w)
    }

    /// Writes the `Internal` struct with name, signature and tag columns aligned
    fn write_internal(&self, w: &mut impl FmtWrite, methods: &[&Method]) -> std::fmt::Result {
        let rows: Vec<(&str, String, String)> = methods
            .iter()
            .map(|m| {
                let sig = format!(
                    "func({}){}",
                    join_fields(&m.params),
                    results_suffix(&m.results)
                );
                let tag = format!("`perm:\"{}\"`", m.perm.as_deref().unwrap_or_default());
                (m.name.as_str(), sig, tag)
            })
            .collect();
        let name_width = rows.iter().map(|r| r.0.chars().count()).max().unwrap_or(0);
        let sig_width = rows.iter().map(|r| r.1.chars().count()).max().unwrap_or(0);

        writeln!(w, "\tInternal struct {{")?;
        for (name, sig, tag) in &rows {
            writeln!(
                w,
                "\t\t{:<name_width$} {:<sig_width$} {}",
                name,
                sig,
                tag,
                name_width = name_width,
                sig_width = sig_width
            )?;
        }
        writeln!(w, "\t}}")
    }
}

fn write_forwarder(w: &mut impl FmtWrite, struct_name: &str, method: &Method) -> std::fmt::Result {
    let mut params = Vec::new();
    let mut args = Vec::new();
    for field in &method.params {
        for _ in 0..field.arity() {
            let arg = format!("p{}", params.len());
            params.push(format!("{} {}", arg, field.ty));
            if field.is_variadic() {
                args.push(format!("{}...", arg));
            } else {
                args.push(arg);
            }
        }
    }

    writeln!(
        w,
        "func (s *{}) {}({}){} {{",
        struct_name,
        method.name,
        params.join(", "),
        results_suffix(&method.results)
    )?;
    let call = format!("s.Internal.{}({})", method.name, args.join(", "));
    if method.results.is_empty() {
        writeln!(w, "\t{}", call)?;
    } else {
        writeln!(w, "\treturn {}", call)?;
    }
    writeln!(w, "}}")
}

fn render_field(field: &Field) -> String {
    if field.names.is_empty() {
        field.ty.clone()
    } else {
        format!("{} {}", field.names.join(", "), field.ty)
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields.iter().map(render_field).collect::<Vec<_>>().join(", ")
}

/// ` T` for one unnamed result, ` (A, B)` otherwise, empty for none
fn results_suffix(results: &[Field]) -> String {
    match results {
        [] => String::new(),
        [single] if single.names.is_empty() => format!(" {}", single.ty),
        _ => format!(" ({})", join_fields(results)),
    }
}
