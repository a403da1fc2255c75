//! Message size analysis
//!
//! Computes per-field and total bit budgets for a descriptor without
//! encoding anything. The same numbers back the CLI report and the
//! pre-encode size check: body size is a pure function of the schema, so
//! oversize messages can be rejected before a single bit is produced.

use std::fmt;

use crate::protocol::RoutingHeader;
use crate::schema::MessageDescriptor;

/// Acoustic data rate used for airtime estimates when none is given, in
/// bits per second. Typical of long-range underwater modems.
pub const DEFAULT_DATA_RATE: u32 = 80;

/// Bit budget of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBudget {
    /// Field name
    pub name: String,
    /// Constraint annotation, e.g. `[0-10000]` or `(enum: 4 values)`
    pub detail: String,
    /// Width in bits
    pub bits: u64,
}

/// Complete size breakdown of a message descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeReport {
    /// Message name
    pub message: String,
    /// Declared message id, if any
    pub id: Option<u16>,
    /// Declared advisory size limit, if any
    pub max_bytes: Option<usize>,
    /// Per-field budgets in declaration order
    pub fields: Vec<FieldBudget>,
    /// Sum of field widths
    pub body_bits: u64,
    /// Body size after padding to a byte boundary
    pub body_bytes: usize,
    /// Zero bits appended to reach the byte boundary
    pub padding_bits: u64,
    /// Mode-2 overhead in bytes (varid), when an id is declared
    pub mode2_overhead: Option<usize>,
    /// Mode-3 overhead in bytes (routing header + varid)
    pub mode3_overhead: Option<usize>,
}

impl SizeReport {
    /// Total wire bytes for mode 1 (the body alone).
    pub fn mode1_total(&self) -> usize {
        self.body_bytes
    }

    /// Total wire bytes for mode 2, when an id is declared.
    pub fn mode2_total(&self) -> Option<usize> {
        self.mode2_overhead.map(|o| o + self.body_bytes)
    }

    /// Total wire bytes for mode 3, when an id is declared.
    pub fn mode3_total(&self) -> Option<usize> {
        self.mode3_overhead.map(|o| o + self.body_bytes)
    }

    /// Whether the body fits the declared `max_bytes`, when one is set.
    pub fn fits_max_bytes(&self) -> Option<bool> {
        self.max_bytes.map(|max| self.body_bytes <= max)
    }

    /// Seconds on the water to transmit the mode-1 body at `data_rate`
    /// bits per second.
    pub fn airtime_secs(&self, data_rate: u32) -> f64 {
        (self.body_bytes as f64 * 8.0) / data_rate as f64
    }
}

/// Analyze a descriptor into a [`SizeReport`].
pub fn analyze(descriptor: &MessageDescriptor) -> SizeReport {
    let fields = descriptor
        .fields()
        .iter()
        .map(|f| FieldBudget {
            name: f.name().to_string(),
            detail: f.kind().describe(),
            bits: f.width_bits(),
        })
        .collect();

    let body_bits = descriptor.body_bits();
    let body_bytes = descriptor.body_bytes();
    let varid_len = descriptor.id().map(|id| if id < 128 { 1 } else { 2 });

    SizeReport {
        message: descriptor.name().to_string(),
        id: descriptor.id(),
        max_bytes: descriptor.max_bytes(),
        fields,
        body_bits,
        body_bytes,
        padding_bits: body_bytes as u64 * 8 - body_bits,
        mode2_overhead: varid_len,
        mode3_overhead: varid_len.map(|len| RoutingHeader::SIZE + len),
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => writeln!(f, "=== {}: {} ===", id, self.message)?,
            None => writeln!(f, "=== {} ===", self.message)?,
        }
        writeln!(
            f,
            "body: {} bits -> {} bytes ({} padding bits)",
            self.body_bits, self.body_bytes, self.padding_bits
        )?;
        for (i, field) in self.fields.iter().enumerate() {
            writeln!(
                f,
                "  {}. {:<20} {:>3} bits  {}",
                i + 1,
                field.name,
                field.bits,
                field.detail
            )?;
        }
        writeln!(f, "mode 1 (body only):     {} bytes", self.mode1_total())?;
        match (self.mode2_total(), self.mode3_total()) {
            (Some(m2), Some(m3)) => {
                writeln!(f, "mode 2 (id-prefixed):   {} bytes", m2)?;
                writeln!(f, "mode 3 (routed):        {} bytes", m3)?;
            }
            _ => writeln!(f, "modes 2/3:              unavailable (no message id)")?,
        }
        if let Some(max) = self.max_bytes {
            let verdict = if self.body_bytes <= max {
                "within"
            } else {
                "EXCEEDS"
            };
            writeln!(
                f,
                "declared limit:         {} bytes ({} limit)",
                max, verdict
            )?;
        }
        writeln!(
            f,
            "airtime @ {} bps:       {:.1} s",
            DEFAULT_DATA_RATE,
            self.airtime_secs(DEFAULT_DATA_RATE)
        )
    }
}
