//! Pricing engine for enrollments.
//!
//! Derives the billable quantity from a schedule's slots and computes the
//! monetary total under the material-surcharge and VAT rules. Pure; the
//! lifecycle manager decides when quotes run and persists the result.

use crate::models::time::round2;
use crate::models::TimeSlot;

/// VAT rate applied when `con_iva` is set.
pub const IVA_RATE: f64 = 0.15;

/// Computed pricing fields for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Billable quantity: the sum of the slots' daily hours. An hours
    /// aggregate, not a slot count, despite the column name.
    pub cantidad: f64,
    /// precio * cantidad
    pub valor_horas: f64,
    /// Final total, rounded to currency precision
    pub valor_total: f64,
}

/// Price a schedule.
///
/// `valor_total` starts from the hours value, adds the materials surcharge
/// when present, then applies VAT to that running subtotal — VAT is never
/// computed on the hours value alone. The result is rounded to two
/// decimals, half away from zero.
pub fn quote(
    precio: f64,
    slots: &[TimeSlot],
    valor_materiales: Option<f64>,
    con_iva: bool,
) -> Quote {
    let cantidad: f64 = slots.iter().map(|slot| slot.horas_diarias).sum();
    let valor_horas = precio * cantidad;

    let mut valor_total = valor_horas;
    if let Some(materiales) = valor_materiales {
        valor_total += materiales;
    }
    if con_iva {
        valor_total += valor_total * IVA_RATE;
    }

    Quote {
        cantidad,
        valor_horas,
        valor_total: round2(valor_total),
    }
}
