//! Pricing engine laws: materials-then-VAT ordering, rounding, idempotence.

use matriculas_rust::api::TimeSlotId;
use matriculas_rust::models::time::{daily_hours, round2};
use matriculas_rust::models::{Dia, Modalidad, TimeSlot};
use matriculas_rust::services::{quote, IVA_RATE};

fn slot(id: i64, inicio: &str, salida: &str) -> TimeSlot {
    let hora_inicio = inicio.parse().unwrap();
    let hora_salida = salida.parse().unwrap();
    TimeSlot {
        id_horario: TimeSlotId::new(id),
        dia: Dia::Lunes,
        hora_inicio,
        hora_salida,
        horas_diarias: daily_hours(hora_inicio, hora_salida),
        modalidad: Modalidad::Virtual,
        aula: None,
        deleted_at: None,
    }
}

#[test]
fn test_reference_scenario() {
    // unitPrice=10, two slots totaling 5 hours, materials=20, VAT=true:
    // hoursValue=50, subtotal=70, total=70*1.15=80.50
    let slots = vec![slot(1, "08:00", "10:00"), slot(2, "14:00", "17:00")];
    let q = quote(10.0, &slots, Some(20.0), true);
    assert_eq!(q.cantidad, 5.0);
    assert_eq!(q.valor_horas, 50.0);
    assert_eq!(q.valor_total, 80.5);
}

#[test]
fn test_vat_applies_after_materials() {
    // VAT on the post-materials subtotal, never on hours alone.
    let slots = vec![slot(1, "08:00", "12:00")];
    for materials in [0.0, 15.0, 99.99] {
        let q = quote(12.5, &slots, Some(materials), true);
        let expected = round2(round2(q.valor_horas + materials) * (1.0 + IVA_RATE));
        assert_eq!(q.valor_total, expected);
    }
}

#[test]
fn test_no_vat_no_materials() {
    let slots = vec![slot(1, "08:00", "09:30")];
    let q = quote(20.0, &slots, None, false);
    assert_eq!(q.cantidad, 1.5);
    assert_eq!(q.valor_total, 30.0);
}

#[test]
fn test_materials_without_vat() {
    let slots = vec![slot(1, "08:00", "10:00")];
    let q = quote(10.0, &slots, Some(12.5), false);
    assert_eq!(q.valor_total, 32.5);
}

#[test]
fn test_overnight_slots_price_by_wrapped_duration() {
    let slots = vec![slot(1, "22:00", "02:00")];
    let q = quote(10.0, &slots, None, false);
    assert_eq!(q.cantidad, 4.0);
    assert_eq!(q.valor_total, 40.0);
}

#[test]
fn test_repricing_is_idempotent() {
    // Re-running the computation with unchanged inputs yields the same
    // total, and re-rounding an already-rounded total is a no-op.
    let slots = vec![slot(1, "08:00", "10:50"), slot(2, "14:00", "15:55")];
    let first = quote(11.0, &slots, Some(7.35), true);
    let second = quote(11.0, &slots, Some(7.35), true);
    assert_eq!(first, second);
    assert_eq!(round2(first.valor_total), first.valor_total);
}

#[test]
fn test_fractional_hours_round_to_currency() {
    // 50 minutes → 0.83 h; 9.99 * 0.83 = 8.2917 → total 8.29
    let slots = vec![slot(1, "08:00", "08:50")];
    let q = quote(9.99, &slots, None, false);
    assert_eq!(q.cantidad, 0.83);
    assert_eq!(q.valor_total, 8.29);
}
