//! PE parsing on top of the `object` crate.

use super::{is_packer_section, suspicious_imports, ExecutableAnalysis, PeFindings, SectionInfo};
use crate::config::ExecutableConfig;
use crate::entropy::{entropy_of_prefix, round3};
use crate::tables::IndicatorTables;
use object::pe::ImageSectionHeader;
use object::read::pe::{Import, ImageNtHeaders, PeFile};
use object::{FileKind, LittleEndian as LE};
use tracing::{debug, warn};

pub(super) fn analyze(
    data: &[u8],
    cfg: &ExecutableConfig,
    tables: &IndicatorTables,
) -> ExecutableAnalysis {
    let result = match FileKind::parse(data) {
        Ok(FileKind::Pe32) => analyze_pe::<object::pe::ImageNtHeaders32>(data, cfg, tables),
        Ok(FileKind::Pe64) => analyze_pe::<object::pe::ImageNtHeaders64>(data, cfg, tables),
        _ => return ExecutableAnalysis::NotExecutable,
    };
    match result {
        Ok(findings) => ExecutableAnalysis::Analyzed(findings),
        Err(e) => {
            warn!("PE analysis failed: {}", e);
            ExecutableAnalysis::ParseError(format!("PE analysis error: {}", e))
        }
    }
}

fn analyze_pe<Pe: ImageNtHeaders>(
    data: &[u8],
    cfg: &ExecutableConfig,
    tables: &IndicatorTables,
) -> object::Result<PeFindings> {
    let pe = PeFile::<Pe, &[u8]>::parse(data)?;

    let imports = collect_imports(&pe);

    let mut sections = Vec::new();
    let mut suspicious_sections = Vec::new();
    let mut packer_hints = Vec::new();
    for hdr in pe.section_table().iter() {
        let info = section_info(hdr, data, cfg);
        if info.entropy >= cfg.suspicious_section_entropy {
            suspicious_sections.push(info.clone());
        }
        if is_packer_section(&info.name, tables) {
            packer_hints.push(info.name.clone());
        }
        sections.push(info);
    }

    let suspicious = suspicious_imports(&imports, tables);
    let timestamp = pe.nt_headers().file_header().time_date_stamp.get(LE);
    debug!(
        "PE: {} imports ({} suspicious), {} sections ({} high-entropy)",
        imports.len(),
        suspicious.len(),
        sections.len(),
        suspicious_sections.len()
    );

    Ok(PeFindings {
        num_imports: imports.len(),
        imports,
        num_suspicious_imports: suspicious.len(),
        suspicious_imports: suspicious,
        sections,
        suspicious_sections,
        packer_hints,
        compile_timestamp_raw: Some(timestamp),
    })
}

fn section_info(hdr: &ImageSectionHeader, data: &[u8], cfg: &ExecutableConfig) -> SectionInfo {
    let raw = &hdr.name;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let name = String::from_utf8_lossy(&raw[..end]).into_owned();
    // Unreadable raw data counts as empty.
    let bytes = hdr.pe_data(data).unwrap_or(&[]);
    SectionInfo {
        name,
        size: u64::from(hdr.size_of_raw_data.get(LE)),
        entropy: round3(entropy_of_prefix(bytes, cfg.section_entropy_window)),
    }
}

/// Named imports across every descriptor. Ordinal-only entries are skipped,
/// and a malformed table keeps whatever was decoded before the fault.
fn collect_imports<'data, Pe: ImageNtHeaders>(pe: &PeFile<'data, Pe, &'data [u8]>) -> Vec<String> {
    let mut out = Vec::new();
    if let Err(e) = walk_imports(pe, &mut out) {
        debug!("import table truncated after {} names: {}", out.len(), e);
    }
    out
}

fn walk_imports<'data, Pe: ImageNtHeaders>(
    pe: &PeFile<'data, Pe, &'data [u8]>,
    out: &mut Vec<String>,
) -> object::Result<()> {
    let table = match pe.import_table()? {
        Some(t) => t,
        None => return Ok(()),
    };
    let mut descriptors = table.descriptors()?;
    while let Some(desc) = descriptors.next()? {
        let lookup = match desc.original_first_thunk.get(LE) {
            0 => desc.first_thunk.get(LE),
            addr => addr,
        };
        let mut thunks = table.thunks(lookup)?;
        while let Some(thunk) = thunks.next::<Pe>()? {
            if let Import::Name(_hint, name) = table.import::<Pe>(thunk)? {
                let name = String::from_utf8_lossy(name);
                if !name.is_empty() {
                    out.push(name.into_owned());
                }
            }
        }
    }
    Ok(())
}
