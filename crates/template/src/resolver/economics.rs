//! Costs, savings, chart axes and the page-3 calculation basis

use super::energy::EnergyFlows;
use super::{first_number, first_text, DynamicData, GenerationRequest, Record};
use crate::settings::{is_truthy, Settings};
use offer_format::{axis_ticks, fmt_number, nice_ceiling};

const VAT_RATE: f64 = 0.19;
const DEFAULT_ELECTRICITY_PRICE: f64 = 0.30;

/// Values that mean "nothing selected" in free-text project fields
const UNSET_TEXTS: &[&str] = &["", "none", "null", "bitte wählen", "please select"];

const TICK_KEYS: [&str; 6] = [
    "axis_tick_1_top",
    "axis_tick_2",
    "axis_tick_3",
    "axis_tick_4",
    "axis_tick_5",
    "axis_tick_6_bottom",
];

const TICK_KEYS_20Y: [&str; 6] = [
    "axis20_tick_1_top",
    "axis20_tick_2",
    "axis20_tick_3",
    "axis20_tick_4",
    "axis20_tick_5",
    "axis20_tick_6_bottom",
];

fn euro(value: f64) -> String {
    fmt_number(Some(value), 2, "€")
}

fn kwh(value: f64) -> String {
    fmt_number(Some(value), 0, "kWh")
}

/// `x,xx` with a German comma, no grouping
fn decimal_comma(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}

/// First number looked up in results, then in project
fn number_in(request: &GenerationRequest, paths: &[&str]) -> Option<f64> {
    first_number(&request.results, paths).or_else(|| first_number(&request.project, paths))
}

/// Project field, also accepted under `project.project_details`
fn project_text(project: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .flat_map(|key| [key.to_string(), format!("project_details.{key}")])
        .filter_map(|path| first_text(project, &[path.as_str()]))
        .find(|text| !UNSET_TEXTS.contains(&text.to_lowercase().as_str()))
}

/// Electricity price in €/kWh; values above 5 are cents
fn electricity_price(request: &GenerationRequest) -> Option<f64> {
    let (project, results) = (&request.project, &request.results);
    let price = first_number(results, &["aktueller_strompreis_fuer_hochrechnung_euro_kwh"])
        .or_else(|| first_number(project, &["electricity_price_eur_per_kwh"]))
        .or_else(|| first_number(results, &["electricity_price_eur_per_kwh"]))
        .or_else(|| first_number(project, &["electricity_price_kwh", "electricity_price_per_kwh"]))?;
    Some(if price > 5.0 { price / 100.0 } else { price })
}

/// Annual price increase in percent
fn price_increase(request: &GenerationRequest, settings: &Settings) -> f64 {
    first_number(
        &request.results,
        &["electricity_price_increase_annual_percent", "electricity_price_increase"],
    )
    .or_else(|| first_number(&request.project, &["electricity_price_increase_annual_percent"]))
    .unwrap_or(settings.electricity_price_increase_annual_percent)
}

/// Current monthly electricity cost in €
fn monthly_cost(request: &GenerationRequest) -> Option<f64> {
    let household = number_in(request, &["stromkosten_haushalt_euro_monat"]).unwrap_or(0.0);
    let heating = number_in(request, &["stromkosten_heizung_euro_monat"]).unwrap_or(0.0);
    if household + heating > 0.0 {
        return Some(household + heating);
    }

    let consumption = number_in(request, &["jahresstromverbrauch_fuer_hochrechnung_kwh"])?;
    let price = number_in(request, &["aktueller_strompreis_fuer_hochrechnung_euro_kwh"])?;
    Some(consumption * price / 12.0).filter(|cost| *cost > 0.0)
}

/// Electricity cost over `years` without and with a yearly increase
///
/// The increase compounds from the second year on.
pub(crate) fn cost_projection(annual_cost: f64, increase_percent: f64, years: u32) -> (f64, f64) {
    let flat = annual_cost * years as f64;
    let factor = 1.0 + increase_percent / 100.0;
    let compound = (0..years).map(|year| annual_cost * factor.powi(year as i32)).sum();
    (flat, compound)
}

fn publish_ticks(data: &mut DynamicData, keys: &[&str; 6], max: f64, decimals: usize) {
    if max <= 0.0 {
        return;
    }
    let ticks = axis_ticks(nice_ceiling(max));
    for (key, tick) in keys.iter().zip(ticks) {
        data.insert(*key, fmt_number(Some(tick), decimals, ""));
    }
}

fn resolve_costs(data: &mut DynamicData, request: &GenerationRequest, settings: &Settings) {
    let Some(monthly) = monthly_cost(request) else {
        log::debug!("no electricity cost basis, skipping cost projection");
        return;
    };
    let increase = price_increase(request, settings);
    let annual = monthly * 12.0;

    let (flat_10, compound_10) = cost_projection(annual, increase, 10);
    let (flat_20, compound_20) = cost_projection(annual, increase, 20);

    for (key, value) in [
        ("cost_10y_no_increase_number", flat_10),
        ("cost_10y_with_increase_number", compound_10),
        ("cost_20y_no_increase_number", flat_20),
        ("cost_20y_with_increase_number", compound_20),
    ] {
        if value > 0.0 {
            data.insert(key, euro(value));
        }
    }

    publish_ticks(data, &TICK_KEYS, flat_10.max(compound_10), 0);
    publish_ticks(data, &TICK_KEYS_20Y, flat_20.max(compound_20), 2);
}

fn resolve_savings(data: &mut DynamicData, request: &GenerationRequest, flows: &EnergyFlows, tariff: f64) {
    let price = electricity_price(request).unwrap_or(DEFAULT_ELECTRICITY_PRICE);
    let feed_in = flows.feed_in.unwrap_or(0.0);
    let surplus = (flows.battery_charge - flows.battery_discharge).max(0.0);

    let lines = [
        ("self_consumption_without_battery_eur", flows.direct * price),
        ("direct_grid_feed_in_eur", feed_in * tariff),
        ("battery_usage_savings_eur", flows.battery_discharge * price),
        ("battery_surplus_feed_in_eur", surplus * tariff),
    ];
    let total: f64 = lines.iter().map(|(_, value)| value).sum();
    for (key, value) in lines {
        data.insert(key, euro(value));
    }
    data.insert("total_annual_savings_eur", euro(total));
    data.insert("annual_total_savings_year1_label", euro(total));

    data.insert("calc_battery_charge_kwh_page3", kwh(flows.battery_charge));
    data.insert("calc_battery_discharge_kwh_page3", kwh(flows.battery_discharge));
    data.insert("calc_battery_surplus_kwh_page3", kwh(surplus));
    data.insert("calc_grid_feed_in_kwh_page3", kwh(feed_in));

    if let Some(feed) = flows.feed_in {
        data.insert("annual_feed_in_revenue_eur", euro(feed * tariff));
    }
}

fn resolve_basis(data: &mut DynamicData, request: &GenerationRequest, settings: &Settings) {
    let (project, results) = (&request.project, &request.results);

    if let Some(price) = electricity_price(request) {
        data.insert("basis_tariff_text", format!("{} € / kWh", decimal_comma(price)));
    }
    if let Some(supplier) = first_text(project, &["energy_supplier", "stromanbieter"])
        .or_else(|| first_text(results, &["energy_supplier"]))
    {
        data.insert("basis_energy_supplier_name", supplier);
    }
    if let Some(pct) = first_number(results, &["maintenance_costs_percent", "maintenance_percent_invest_pa"]) {
        data.insert(
            "basis_maintenance_percent_invest",
            format!("{} % Invest. p.a.", decimal_comma(pct)),
        );
    }
    if let Some(years) = number_in(request, &["simulation_period_years"]) {
        data.insert("basis_pv_lifetime_years", format!("{} Jahre", years.trunc() as i64));
    }
    data.insert(
        "basis_price_increase_percent_text",
        format!("{} % jährlich", decimal_comma(price_increase(request, settings))),
    );
    if let Some(pct) = number_in(request, &["cost_of_capital_percent"])
        .or_else(|| first_number(results, &["alternative_investment_interest_rate_percent"]))
    {
        data.insert("basis_cost_of_capital_percent", format!("{} %", decimal_comma(pct)));
    }
}

fn resolve_project_texts(data: &mut DynamicData, request: &GenerationRequest) {
    let project = &request.project;

    let orientation = first_text(&request.results, &["orientation_text", "orientation", "ausrichtung"])
        .filter(|text| !UNSET_TEXTS.contains(&text.to_lowercase().as_str()))
        .or_else(|| project_text(project, &["orientation", "ausrichtung", "roof_orientation"]))
        .unwrap_or_else(|| "Süd".to_string());
    data.insert("orientation_text", orientation);

    if let Some(covering) = project_text(project, &["roof_covering_type", "roof_covering"]) {
        data.insert("roof_covering_type", covering);
    }

    let inclination = project_text(project, &["roof_inclination_deg", "roof_inclination"])
        .map(|text| match offer_format::parse_float(&text) {
            Some(deg) => format!("{deg:.0}°"),
            None => text,
        })
        .unwrap_or_else(|| "30°".to_string());
    data.insert("roof_inclination_text", inclination);

    let roof_type = project_text(
        project,
        &["roof_type", "roof_structure", "dach_art", "dachtyp", "roof_material", "dach_typ"],
    )
    .unwrap_or_else(|| "Standard".to_string());
    data.insert("roof_type", roof_type);

    let requested = [
        "financing_requested",
        "financing_needed",
        "financing_leasing_required",
        "finanzierung_leasing_gewuenscht",
        "project_details.financing_needed",
        "customer_data.financing_requested",
    ]
    .iter()
    .filter_map(|path| super::lookup(project, path))
    .any(|value| {
        is_truthy(value)
            || value
                .as_str()
                .map(|s| matches!(s.trim().to_lowercase().as_str(), "ja" | "wahr"))
                .unwrap_or(false)
    });
    let financing = if requested {
        first_text(project, &["financing_type"]).unwrap_or_else(|| "Ja".to_string())
    } else {
        "Nein".to_string()
    };
    data.insert("financing_needed_text", financing);
}

fn resolve_investment(data: &mut DynamicData, request: &GenerationRequest) {
    let results = &request.results;

    if let Some(lcoe) = first_number(results, &["lcoe_euro_per_kwh"]) {
        data.insert("lcoe_cent_per_kwh", fmt_number(Some(lcoe * 100.0), 1, "Cent"));
    }
    if let Some(irr) = first_number(results, &["irr_percent"]) {
        data.insert("irr_percent", fmt_number(Some(irr), 1, "%"));
        data.insert(
            "rendite_line_2",
            format!("Rendite (interner Zinsfuß): {}", fmt_number(Some(irr), 1, "%")),
        );
    }

    let net = first_number(results, &["total_investment_netto", "final_price", "subtotal_netto"]);
    let vat = match net {
        Some(net) => Some(net * VAT_RATE),
        None => first_number(results, &["total_investment_brutto"])
            .zip(first_number(results, &["total_investment_netto"]))
            .map(|(brutto, netto)| (brutto - netto).max(0.0)),
    };
    if let Some(vat) = vat {
        data.insert("vat_amount_eur", euro(vat));
    }
}

pub(super) fn resolve(
    data: &mut DynamicData,
    request: &GenerationRequest,
    settings: &Settings,
    flows: &EnergyFlows,
    tariff: f64,
    total_pages: usize,
) {
    resolve_investment(data, request);
    resolve_costs(data, request, settings);
    resolve_savings(data, request, flows, tariff);
    resolve_basis(data, request, settings);
    resolve_project_texts(data, request);

    data.insert("static_inklusive", "inklusive");
    data.insert("static_dc_dachmontage", "DC Dachmontage");
    data.insert("static_ac_installation", "AC Installation | Inbetriebnahme");
    data.insert("page_number_with_total", format!("Seite 3 von {total_pages}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(results: serde_json::Value, project: serde_json::Value) -> GenerationRequest {
        serde_json::from_value(json!({ "results": results, "project": project })).unwrap()
    }

    fn run(request: &GenerationRequest, flows: &EnergyFlows) -> DynamicData {
        let mut data = DynamicData::new();
        resolve(&mut data, request, &Settings::default(), flows, 0.0786, 7);
        data
    }

    #[test]
    fn test_cost_projection() {
        let (flat, compound) = cost_projection(1200.0, 0.0, 10);
        assert_eq!(flat, 12000.0);
        assert!((compound - 12000.0).abs() < 1e-9);

        let (flat, compound) = cost_projection(1000.0, 10.0, 2);
        assert_eq!(flat, 2000.0);
        assert!((compound - 2100.0).abs() < 1e-9);
    }

    #[test]
    fn test_costs_and_ticks() {
        let req = request(
            json!({ "electricity_price_increase_annual_percent": 0.0001 }),
            json!({ "stromkosten_haushalt_euro_monat": 100, "stromkosten_heizung_euro_monat": 25 }),
        );
        let data = run(&req, &EnergyFlows::default());
        assert_eq!(data.get("cost_10y_no_increase_number"), Some("15.000,00 €"));
        assert_eq!(data.get("cost_20y_no_increase_number"), Some("30.000,00 €"));
        // 1.2 x 15.000 = 18.000 -> 20.000
        assert_eq!(data.get("axis_tick_1_top"), Some("20.000"));
        assert_eq!(data.get("axis_tick_2"), Some("16.000"));
        assert_eq!(data.get("axis_tick_6_bottom"), Some("0"));
        assert_eq!(data.get("axis20_tick_1_top"), Some("50.000,00"));
    }

    #[test]
    fn test_monthly_cost_from_consumption() {
        let req = request(
            json!({
                "jahresstromverbrauch_fuer_hochrechnung_kwh": 4000,
                "aktueller_strompreis_fuer_hochrechnung_euro_kwh": 0.30
            }),
            json!({}),
        );
        assert!((monthly_cost(&req).unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(monthly_cost(&request(json!({}), json!({}))), None);
    }

    #[test]
    fn test_no_costs_no_ticks() {
        let data = run(&request(json!({}), json!({})), &EnergyFlows::default());
        assert!(!data.contains_key("cost_10y_no_increase_number"));
        assert!(!data.contains_key("axis_tick_1_top"));
    }

    #[test]
    fn test_savings_block() {
        let flows = EnergyFlows {
            direct: 2000.0,
            battery_charge: 3000.0,
            battery_discharge: 2500.0,
            feed_in: Some(3000.0),
            ..EnergyFlows::default()
        };
        let req = request(json!({}), json!({ "electricity_price_kwh": 40 }));
        let mut data = DynamicData::new();
        resolve(&mut data, &req, &Settings::default(), &flows, 0.08, 7);

        // 40 is read as cents
        assert_eq!(data.get("self_consumption_without_battery_eur"), Some("800,00 €"));
        assert_eq!(data.get("direct_grid_feed_in_eur"), Some("240,00 €"));
        assert_eq!(data.get("battery_usage_savings_eur"), Some("1.000,00 €"));
        assert_eq!(data.get("battery_surplus_feed_in_eur"), Some("40,00 €"));
        assert_eq!(data.get("total_annual_savings_eur"), Some("2.080,00 €"));
        assert_eq!(data.get("annual_total_savings_year1_label"), Some("2.080,00 €"));
        assert_eq!(data.get("calc_battery_surplus_kwh_page3"), Some("500 kWh"));
        assert_eq!(data.get("annual_feed_in_revenue_eur"), Some("240,00 €"));
        assert_eq!(data.get("basis_tariff_text"), Some("0,40 € / kWh"));
    }

    #[test]
    fn test_default_price() {
        let flows = EnergyFlows {
            direct: 1000.0,
            ..EnergyFlows::default()
        };
        let data = run(&request(json!({}), json!({})), &flows);
        assert_eq!(data.get("self_consumption_without_battery_eur"), Some("300,00 €"));
        assert!(!data.contains_key("basis_tariff_text"));
    }

    #[test]
    fn test_investment_fields() {
        let req = request(
            json!({ "lcoe_euro_per_kwh": 0.0912, "irr_percent": 7.34, "total_investment_netto": 10000 }),
            json!({}),
        );
        let data = run(&req, &EnergyFlows::default());
        assert_eq!(data.get("lcoe_cent_per_kwh"), Some("9,1 Cent"));
        assert_eq!(data.get("irr_percent"), Some("7,3 %"));
        assert_eq!(data.get("rendite_line_2"), Some("Rendite (interner Zinsfuß): 7,3 %"));
        assert_eq!(data.get("vat_amount_eur"), Some("1.900,00 €"));
    }

    #[test]
    fn test_project_text_defaults() {
        let data = run(
            &request(json!({}), json!({ "orientation": "Bitte wählen", "roof_type": "null" })),
            &EnergyFlows::default(),
        );
        assert_eq!(data.get("orientation_text"), Some("Süd"));
        assert_eq!(data.get("roof_inclination_text"), Some("30°"));
        assert_eq!(data.get("roof_type"), Some("Standard"));
        assert_eq!(data.get("financing_needed_text"), Some("Nein"));
        assert_eq!(data.get("page_number_with_total"), Some("Seite 3 von 7"));
        assert_eq!(data.get("static_dc_dachmontage"), Some("DC Dachmontage"));
        assert_eq!(data.get("basis_price_increase_percent_text"), Some("5,00 % jährlich"));
    }

    #[test]
    fn test_project_texts() {
        let data = run(
            &request(
                json!({}),
                json!({
                    "project_details": { "roof_orientation": "Süd-West", "roof_inclination_deg": 35 },
                    "roof_covering": "Ziegel",
                    "dachtyp": "Satteldach",
                    "financing_needed": "Ja",
                    "financing_type": "Ratenkredit"
                }),
            ),
            &EnergyFlows::default(),
        );
        assert_eq!(data.get("orientation_text"), Some("Süd-West"));
        assert_eq!(data.get("roof_inclination_text"), Some("35°"));
        assert_eq!(data.get("roof_covering_type"), Some("Ziegel"));
        assert_eq!(data.get("roof_type"), Some("Satteldach"));
        assert_eq!(data.get("financing_needed_text"), Some("Ratenkredit"));
    }
}
