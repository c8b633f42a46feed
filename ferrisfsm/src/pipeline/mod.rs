//! Pipeline orchestrator.
//!
//! Ties the stages together: resolve the attributes against the index, load
//! the template, run the engine and map the table to records. Each stage stops
//! the run at its first failure, tagged with the stage it came from (see
//! [`Error::stage`](crate::Error::stage)).
//!
//! Nothing is cached between runs: the index and the template are read from
//! the [`TemplateSource`] on every invocation.

mod builder;
mod config;
mod parsed;
mod source;

pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use parsed::Parsed;
pub use source::{DEFAULT_INDEX_FILE, DirectorySource, MemorySource, TemplateSource};

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};

use crate::engine::{self, Table};
use crate::error::{Error, IndexError, Result, TemplateError};
use crate::index::{Attributes, Index};
use crate::record::Record;
use crate::template::{EofPolicy, Template};

/// Resolves, loads and runs templates against raw command output.
///
/// A pipeline only holds read-only data and can be shared between threads.
///
/// # Example
///
/// ```rust
/// use ferrisfsm::{Attributes, MemorySource, PipelineBuilder};
///
/// let source = MemorySource::new()
///     .with_index("Template=vlan.template, Vendor=cisco, Command=show vlan")
///     .with_template(
///         "vlan.template",
///         "Value VLAN_ID (\\d+)\nValue NAME (\\S+)\n\nStart\n  ^${VLAN_ID}\\s+${NAME} -> Record\n",
///     );
/// let pipeline = PipelineBuilder::from_source(source).build();
///
/// let attrs = Attributes::new()
///     .with("Vendor", "cisco")
///     .with("Command", "show vlan");
/// let records = pipeline.run(&attrs, "10   data\n20   voice\n")?;
/// assert_eq!(records[1]["name"], "voice");
/// # Ok::<(), ferrisfsm::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Arc<dyn TemplateSource>,
    eof_policy: Option<EofPolicy>,
}

impl Pipeline {
    pub(crate) fn new(source: Arc<dyn TemplateSource>, eof_policy: Option<EofPolicy>) -> Self {
        Self { source, eof_policy }
    }

    /// Create a builder for a template directory.
    pub fn builder(root: impl Into<std::path::PathBuf>) -> PipelineBuilder {
        PipelineBuilder::from_dir(root)
    }

    /// The storage this pipeline reads from.
    pub fn source(&self) -> &dyn TemplateSource {
        self.source.as_ref()
    }

    /// The forced end-of-input policy, if any.
    pub fn eof_policy(&self) -> Option<EofPolicy> {
        self.eof_policy
    }

    /// Read and parse the index.
    pub fn index(&self) -> Result<Index> {
        let text = self.source.read_index().map_err(|source| IndexError::Read {
            name: self.source.index_name(),
            source,
        })?;
        Ok(Index::parse_str(&text)?)
    }

    /// Find the template identifier for a set of attributes.
    pub fn resolve(&self, attributes: &Attributes) -> Result<String> {
        resolve_in(&self.index()?, attributes)
    }

    /// Load and validate a template by identifier.
    pub fn load(&self, id: &str) -> Result<Template> {
        let text = self.source.read_template(id).map_err(|source| TemplateError::Read {
            name: id.to_string(),
            source,
        })?;
        let template = Template::parse_str(&text).inspect_err(|e| {
            warn!("Template '{}' failed validation: {}", id, e);
        })?;

        Ok(match self.eof_policy {
            Some(policy) => template.with_eof_policy(policy),
            None => template,
        })
    }

    /// Run a loaded template over raw text.
    pub fn parse(&self, template: &Template, text: &str) -> Result<Table> {
        Ok(engine::parse(template, text)?)
    }

    /// Resolve, load, parse and map in one go.
    pub fn run(&self, attributes: &Attributes, text: &str) -> Result<Vec<Record>> {
        self.run_detailed(attributes, text).map(Parsed::into_records)
    }

    /// Like [`run`](Self::run), decoding the input as UTF-8 and replacing
    /// invalid sequences.
    pub fn run_bytes(&self, attributes: &Attributes, bytes: &[u8]) -> Result<Vec<Record>> {
        self.run(attributes, &String::from_utf8_lossy(bytes))
    }

    /// Like [`run`](Self::run), keeping the template id, the table and timing.
    pub fn run_detailed(&self, attributes: &Attributes, text: &str) -> Result<Parsed> {
        let start = Instant::now();

        let id = self.resolve(attributes)?;
        let template = self.load(&id)?;
        let table = self.parse(&template, text)?;

        let parsed = Parsed::new(id, table, start.elapsed());
        debug!(
            "Parsed {} records with '{}' in {:?}",
            parsed.len(),
            parsed.template,
            parsed.elapsed
        );
        Ok(parsed)
    }
}

fn resolve_in(index: &Index, attributes: &Attributes) -> Result<String> {
    match index.resolve(attributes) {
        Some(rule) => {
            debug!(
                "Resolved {} to '{}' (index line {}, {} constraints)",
                attributes,
                rule.template,
                rule.line,
                rule.specificity()
            );
            Ok(rule.template.clone())
        }
        None => Err(Error::TemplateNotFound {
            attributes: attributes.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, Stage};

    const VLAN_TEMPLATE: &str = "\
Value VLAN_ID (\\d+)
Value NAME (\\S+)

Start
  ^${VLAN_ID}\\s+${NAME} -> Record
";

    fn pipeline() -> Pipeline {
        let source = MemorySource::new()
            .with_index(
                "# test index\n\
                 Template=vlan.template, Vendor=cisco, Command=sh[[ow]] vl[[an]]\n\
                 Template=broken.template, Vendor=cisco, Command=show broken\n\
                 Template=missing.template, Vendor=cisco, Command=show missing\n\
                 Template=error.template, Vendor=cisco, Command=show error\n",
            )
            .with_template("vlan.template", VLAN_TEMPLATE)
            .with_template("broken.template", "Start\n  ^x -> Nowhere\n")
            .with_template(
                "error.template",
                "Value X (\\S+)\n\nStart\n  ^% -> Error \"device refused\"\n  ^${X} -> Record\n",
            );
        PipelineBuilder::from_source(source).build()
    }

    fn cisco(command: &str) -> Attributes {
        Attributes::new()
            .with("Vendor", "cisco")
            .with("Command", command)
    }

    #[test]
    fn test_resolve() {
        assert_eq!(pipeline().resolve(&cisco("show vlan")).unwrap(), "vlan.template");
        assert_eq!(pipeline().resolve(&cisco("sh vl")).unwrap(), "vlan.template");
    }

    #[test]
    fn test_run_vlans() {
        let records = pipeline()
            .run(&cisco("show vlan"), "10   data\n20   voice\n")
            .unwrap();
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(
            json,
            r#"[{"vlan_id":"10","name":"data"},{"vlan_id":"20","name":"voice"}]"#
        );
    }

    #[test]
    fn test_unmatched_lines_are_skipped() {
        let records = pipeline()
            .run(
                &cisco("show vlan"),
                "VLAN Name\n---- ----\n10   data\ngarbage !!\n20   voice\n",
            )
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["vlan_id"], "20");
    }

    #[test]
    fn test_template_not_found() {
        let attrs = Attributes::new()
            .with("Vendor", "juniper")
            .with("Command", "show vlan");
        let err = pipeline().run(&attrs, "10 data\n").unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
        assert_eq!(err.stage(), Stage::Resolve);
        assert!(err.to_string().contains("juniper"));
    }

    #[test]
    fn test_index_failures_are_resolve_stage() {
        let pipeline = PipelineBuilder::from_source(MemorySource::new()).build();
        let err = pipeline.run(&cisco("show vlan"), "").unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::Read { .. })));
        assert_eq!(err.stage(), Stage::Resolve);

        let source = MemorySource::new().with_index("Template=x\n");
        let err = PipelineBuilder::from_source(source)
            .build()
            .run(&cisco("show vlan"), "")
            .unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::NoConstraints { .. })));
        assert_eq!(err.stage(), Stage::Resolve);
    }

    #[test]
    fn test_load_failures() {
        let err = pipeline().run(&cisco("show broken"), "x\n").unwrap_err();
        assert!(matches!(
            err,
            Error::TemplateLoad(TemplateError::UnknownState { .. })
        ));
        assert_eq!(err.stage(), Stage::Load);

        let err = pipeline().run(&cisco("show missing"), "x\n").unwrap_err();
        assert!(matches!(err, Error::TemplateLoad(TemplateError::Read { .. })));
        assert_eq!(err.to_failure().stage, Stage::Load);
    }

    #[test]
    fn test_parse_failure_returns_no_partial_rows() {
        let err = pipeline()
            .run(&cisco("show error"), "a\nb\n% Invalid input\nc\n")
            .unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::RuleError { .. })));
        assert_eq!(err.stage(), Stage::Parse);
        assert!(err.to_string().contains("device refused"));
    }

    #[test]
    fn test_run_detailed() {
        let parsed = pipeline()
            .run_detailed(&cisco("show vlan"), "10   data\n")
            .unwrap();
        assert_eq!(parsed.template, "vlan.template");
        assert_eq!(parsed.table.header(), ["VLAN_ID", "NAME"]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.iter().count(), 1);
    }

    #[test]
    fn test_run_bytes_is_lossy() {
        let records = pipeline()
            .run_bytes(&cisco("show vlan"), b"10   d\xffta\n")
            .unwrap();
        assert_eq!(records[0]["name"], "d\u{fffd}ta");
    }

    #[test]
    fn test_forced_eof_policy() {
        let source = MemorySource::new()
            .with_index("Template=t, Command=show\n")
            .with_template("t", "Value X (\\S+)\n\nStart\n  ^${X}\n");
        let attrs = Attributes::new().with("Command", "show");

        let records = PipelineBuilder::from_source(source.clone())
            .build()
            .run(&attrs, "only\n")
            .unwrap();
        assert_eq!(records.len(), 1);

        let records = PipelineBuilder::from_source(source)
            .eof_policy(EofPolicy::Discard)
            .build()
            .run(&attrs, "only\n")
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_concurrent_runs() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();

        let pipeline = pipeline();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let pipeline = &pipeline;
                    s.spawn(move || {
                        let text = format!("{i}   vlan{i}\n");
                        pipeline.run(&cisco("show vlan"), &text).unwrap()
                    })
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                let records = handle.join().unwrap();
                assert_eq!(records[0]["vlan_id"], i.to_string().as_str());
            }
        });
    }

    #[test]
    fn test_directory_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index"),
            "Template=vlan.template, Vendor=cisco, Command=show vlan\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("vlan.template"), VLAN_TEMPLATE).unwrap();

        let pipeline = Pipeline::builder(dir.path()).build();
        let records = pipeline.run(&cisco("show vlan"), "10   data\n").unwrap();
        assert_eq!(records[0]["name"], "data");

        let config = PipelineConfig::new(dir.path());
        let pipeline = PipelineBuilder::from_config(&config).build();
        assert_eq!(pipeline.index().unwrap().len(), 1);
    }

    fn bundled() -> Pipeline {
        Pipeline::builder(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")).build()
    }

    fn attrs(vendor: &str, command: &str) -> Attributes {
        Attributes::new()
            .with("Vendor", vendor)
            .with("Command", command)
    }

    #[test]
    fn test_bundled_templates_load() {
        let pipeline = bundled();
        let index = pipeline.index().unwrap();
        assert_eq!(index.len(), 5);
        for rule in index.rules() {
            pipeline.load(&rule.template).unwrap();
        }
    }

    #[test]
    fn test_bundled_cisco_vlan() {
        let output = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi0/1, Gi0/2, Gi0/3
                                                Gi0/4
10   data                             active    Gi0/5
20   voice                            active
1002 fddi-default                     act/unsup

VLAN Type  SAID       MTU   Parent RingNo BridgeNo Stp  BrdgMode Trans1 Trans2
---- ----- ---------- ----- ------ ------ -------- ---- -------- ------ ------
1    enet  100001     1500  -      -      -        -    -        0      0
";
        let parsed = bundled()
            .run_detailed(&attrs("cisco_ios", "sh vlan"), output)
            .unwrap();
        assert_eq!(parsed.template, "cisco_ios_show_vlan.textfsm");
        assert_eq!(
            parsed.table.header(),
            ["VLAN_ID", "NAME", "STATUS", "INTERFACES"]
        );

        let records = parsed.records;
        assert_eq!(records.len(), 4);
        assert_eq!(
            serde_json::to_value(&records[0]).unwrap(),
            serde_json::json!({
                "vlan_id": "1",
                "name": "default",
                "status": "active",
                "interfaces": ["Gi0/1", "Gi0/2", "Gi0/3", "Gi0/4"],
            })
        );
        assert_eq!(records[1]["vlan_id"], "10");
        assert_eq!(
            records[1].get("interfaces").and_then(|c| c.as_list()),
            Some(&["Gi0/5".to_string()][..])
        );
        assert!(records[2]["interfaces"].is_empty());
        assert_eq!(records[3]["status"], "act/unsup");
    }

    #[test]
    fn test_bundled_cisco_ip_interface_brief() {
        let output = "\
Interface              IP-Address      OK? Method Status                Protocol
GigabitEthernet0/0     10.0.0.1        YES NVRAM  up                    up
GigabitEthernet0/1     unassigned      YES unset  administratively down down
Loopback0              192.0.2.1       YES manual up                    up
";
        let attrs = attrs("cisco_ios", "show ip int brief");
        let records = bundled().run(&attrs, output).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["interface"], "GigabitEthernet0/1");
        assert_eq!(records[1]["status"], "administratively down");
        assert_eq!(records[1]["protocol"], "down");
        assert_eq!(records[2]["ip_address"], "192.0.2.1");

        let err = bundled()
            .run(&attrs, "% Invalid input detected at '^' marker.\n")
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Parse);
        assert!(err.to_string().contains("device rejected the command"));
    }

    #[test]
    fn test_bundled_arista_version() {
        let output = "\
Arista DCS-7050TX-64-R
Hardware version:    01.11
Serial number:       JPE12345678
System MAC address:  001c.7312.3456

Software image version: 4.22.4M
Architecture:           i386
Internal build version: 4.22.4M-16208165.4224M

Uptime:                 6 weeks, 1 day, 2 hours and 10 minutes
Total memory:           3818208 kB
Free memory:            2397020 kB
";
        let records = bundled()
            .run(&attrs("arista_eos", "show version"), output)
            .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["model"], "DCS-7050TX-64-R");
        assert_eq!(record["serial_number"], "JPE12345678");
        assert_eq!(record["image"], "4.22.4M");
        assert_eq!(record["uptime"], "6 weeks, 1 day, 2 hours and 10 minutes");
        assert_eq!(record["free_memory"], "2397020");
    }

    #[test]
    fn test_bundled_junos_interfaces_terse() {
        let output = "\
Interface               Admin Link Proto    Local                 Remote
ge-0/0/0                up    up
ge-0/0/0.0              up    up   inet     10.0.0.1/24
                                   inet6    fe80::1/64
ge-0/0/1                up    down
lo0.0                   up    up   inet     127.0.0.1           --> 0/0

{master:0}
";
        let records = bundled()
            .run(&attrs("juniper_junos", "show interfaces terse"), output)
            .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0]["interface"], "ge-0/0/0");
        assert_eq!(
            records[1].get("local").and_then(|c| c.as_list()),
            Some(&["10.0.0.1/24".to_string(), "fe80::1/64".to_string()][..])
        );
        assert_eq!(
            records[1].get("protocol").and_then(|c| c.as_list()),
            Some(&["inet".to_string(), "inet6".to_string()][..])
        );
        assert_eq!(records[2]["link_state"], "down");
        assert_eq!(records[3]["interface"], "lo0.0");
    }

    #[test]
    fn test_bundled_linux_df() {
        let output = "\
Filesystem      Size  Used Avail Use% Mounted on
/dev/sda1        50G   20G   28G  42% /
tmpfs           3.9G     0  3.9G   0% /dev/shm
/dev/mapper/vg0-very--long--logical--volume--name
                 200G  150G   40G  79% /data
";
        let records = bundled()
            .run(&attrs("linux", "df -h"), output)
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["use_percent"], "42");
        assert_eq!(
            records[2]["filesystem"],
            "/dev/mapper/vg0-very--long--logical--volume--name"
        );
        assert_eq!(records[2]["mounted_on"], "/data");
    }
}
