//! System KPIs, yearly energy flows and the percentage partitions

use super::{first_number, list_sum, percent_text, DynamicData, GenerationRequest};
use offer_format::{fmt_number, group_thousands, Partition};

/// Battery cycles per year assumed by the storage heuristic
pub const STORAGE_CYCLES_PER_YEAR: f64 = 300.0;

const BATTERY_NOTE: &str = "Hinweis: Batteriespeicher-Jahreswert überschlägig mit \
Speicherkapazität × 300 Tage kalkuliert (statt 365).";

/// One share of the production partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionShare {
    Direct,
    Battery,
    FeedIn,
}

/// Template slot fed by a production share
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapEntry {
    pub slot: &'static str,
    pub share: ProductionShare,
    /// `"58%"` when set, bare `"58"` otherwise
    pub percent_sign: bool,
}

/// Which production share each page-2 template slot shows
///
/// The page-2 artwork labels its upper arrows differently from what the
/// customer-facing numbers must say: the slot drawn under "direct
/// consumption" carries the feed-in share and the bare-number feed-in slot
/// carries the direct share.
pub const PRODUCTION_LABEL_SWAP: [SwapEntry; 3] = [
    SwapEntry {
        slot: "direct_consumption_quote_prod_percent",
        share: ProductionShare::FeedIn,
        percent_sign: true,
    },
    SwapEntry {
        slot: "battery_use_quote_prod_percent",
        share: ProductionShare::Battery,
        percent_sign: true,
    },
    SwapEntry {
        slot: "feed_in_quote_prod_percent_number",
        share: ProductionShare::Direct,
        percent_sign: false,
    },
];

/// Yearly figures shared with the economics and product resolvers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyFlows {
    /// System size in kWp (0 when unknown)
    pub anlage_kwp: f64,
    pub module_count: Option<f64>,
    pub storage_kwh: Option<f64>,
    /// Total inverter power in kW
    pub inverter_kw: Option<f64>,
    pub production: Option<f64>,
    pub consumption: Option<f64>,
    pub direct: f64,
    pub battery_charge: f64,
    pub battery_discharge: f64,
    pub feed_in: Option<f64>,
    pub grid_purchase: Option<f64>,
}

impl EnergyFlows {
    pub fn has_storage(&self) -> bool {
        self.storage_kwh.is_some()
    }
}

fn system_kwp(request: &GenerationRequest) -> Option<f64> {
    if let Some(kwp) = first_number(&request.results, &["anlage_kwp"]) {
        return Some(kwp);
    }
    let quantity = first_number(&request.project, &["module_quantity"]).unwrap_or(0.0);
    let watts = first_number(&request.project, &["selected_module_capacity_w"]).unwrap_or(0.0);
    if quantity > 0.0 && watts > 0.0 {
        return Some(quantity * watts / 1000.0);
    }
    first_number(&request.project, &["anlage_kwp"])
}

fn storage_capacity(request: &GenerationRequest) -> Option<f64> {
    let (project, results) = (&request.project, &request.results);
    [
        first_number(project, &["selected_storage_storage_power_kw"]),
        first_number(results, &["battery_capacity_kwh"]),
        first_number(project, &["selected_storage_capacity_kwh"]),
        first_number(project, &["battery_capacity_kwh"]),
        first_number(results, &["selected_storage_storage_power_kw"]),
    ]
    .into_iter()
    .flatten()
    .find(|kwh| *kwh > 0.0)
}

/// Total inverter power in kW; values above 100 are read as W
fn inverter_power_kw(request: &GenerationRequest) -> Option<f64> {
    let project = &request.project;
    let kw = first_number(project, &["selected_inverter_power_kw", "inverter_power_kw"]).or_else(|| {
        let single = first_number(project, &["selected_inverter_power_kw_single"])?;
        let quantity = first_number(project, &["selected_inverter_quantity"]).unwrap_or(1.0);
        Some(single * quantity)
    })?;
    let kw = if kw > 100.0 { kw / 1000.0 } else { kw };
    Some(kw).filter(|kw| *kw > 0.0)
}

fn annual_consumption(request: &GenerationRequest) -> Option<f64> {
    let (project, results) = (&request.project, &request.results);
    if let Some(sum) = list_sum(results, "monthly_consumption_sim").filter(|s| *s > 0.0) {
        return Some(sum);
    }
    first_number(
        results,
        &[
            "annual_consumption_kwh",
            "annual_consumption_kwh_yr",
            "total_consumption_kwh_yr",
            "annual_consumption",
            "jahresstromverbrauch_fuer_hochrechnung_kwh",
        ],
    )
    .or_else(|| first_number(project, &["annual_consumption_kwh_yr", "annual_consumption_kwh"]))
    .or_else(|| {
        let household = first_number(project, &["annual_consumption_kwh"]).unwrap_or(0.0);
        let heating = first_number(project, &["consumption_heating_kwh_yr"]).unwrap_or(0.0);
        Some(household + heating).filter(|sum| *sum > 0.0)
    })
}

fn share_of(partition: &Partition, share: ProductionShare) -> u32 {
    match share {
        ProductionShare::Direct => partition.first,
        ProductionShare::Battery => partition.second,
        ProductionShare::FeedIn => partition.third,
    }
}

pub(super) fn resolve(data: &mut DynamicData, request: &GenerationRequest) -> EnergyFlows {
    let (project, results) = (&request.project, &request.results);
    let mut flows = EnergyFlows::default();

    if let Some(kwp) = system_kwp(request) {
        flows.anlage_kwp = kwp;
        data.insert("anlage_kwp", fmt_number(Some(kwp), 2, "kWp"));
        data.insert("pv_power_kWp", fmt_number(Some(kwp), 2, "kWp"));
    }

    flows.module_count = first_number(project, &["module_quantity"])
        .or_else(|| first_number(results, &["module_quantity"]));
    if let Some(count) = flows.module_count {
        let number = fmt_number(Some(count), 0, "");
        data.insert("pv_modules_count_with_unit", format!("{number} Stück"));
        data.insert("pv_modules_count_number", number);
    }

    flows.storage_kwh = storage_capacity(request);
    match flows.storage_kwh {
        Some(kwh) => {
            let capacity = fmt_number(Some(kwh), 2, "kWh");
            data.insert("battery_capacity_kwh", capacity.clone());
            data.insert("storage_capacity_kwh", capacity.clone());
            data.insert("storage_section_title", format!("BATTERIESPEICHER – {capacity}"));
            data.insert(
                "storage_expected_annual_kwh",
                fmt_number(Some(kwh * STORAGE_CYCLES_PER_YEAR), 0, "kWh"),
            );
        }
        None => data.insert("storage_section_title", "BATTERIESPEICHER"),
    }

    let annual_production = first_number(
        results,
        &["annual_pv_production_kwh", "annual_yield_kwh", "sim_annual_yield_kwh"],
    );
    if let Some(kwh) = annual_production {
        data.insert("annual_pv_production_kwh", fmt_number(Some(kwh), 2, "kWh"));
        data.insert("pv_prod_kwh_short", fmt_number(Some(kwh), 0, "kWh"));
    }

    flows.inverter_kw = inverter_power_kw(request);
    match flows.inverter_kw {
        Some(kw) => {
            data.insert("inverter_total_power_kw", fmt_number(Some(kw), 0, "kW"));
            let watts = (kw * 1000.0).round() as u64;
            data.insert(
                "inverter_section_title",
                format!("WECHSELRICHTER – {} W", group_thousands(watts, '.')),
            );
        }
        None => data.insert("inverter_section_title", "WECHSELRICHTER"),
    }

    if let Some(pct) = first_number(
        results,
        &["self_supply_rate_percent", "self_sufficiency_percent", "autarky_percent"],
    ) {
        data.insert("self_supply_rate_percent", percent_text(pct));
    }
    if let Some(pct) = first_number(results, &["self_consumption_percent"]) {
        data.insert("self_consumption_percent", percent_text(pct));
    }
    if let Some(years) = first_number(results, &["amortization_time_years", "amortisationszeit_jahre"]) {
        data.insert("amortization_time", fmt_number(Some(years), 2, "Jahre"));
    }

    resolve_flows(data, request, annual_production, &mut flows);
    flows
}

fn resolve_flows(
    data: &mut DynamicData,
    request: &GenerationRequest,
    annual_production: Option<f64>,
    flows: &mut EnergyFlows,
) {
    let results = &request.results;

    let production = list_sum(results, "monthly_productions_sim")
        .filter(|sum| *sum > 0.0)
        .or(annual_production);
    let consumption = annual_consumption(request);

    let mut direct = list_sum(results, "monthly_direct_self_consumption_kwh").unwrap_or(0.0);
    let mut charge = list_sum(results, "monthly_storage_charge_kwh").unwrap_or(0.0);
    let mut discharge = list_sum(results, "monthly_storage_discharge_for_sc_kwh").unwrap_or(0.0);

    if let Some(kwh) = flows.storage_kwh {
        charge = kwh * STORAGE_CYCLES_PER_YEAR;
        discharge = charge;
    }

    if let Some(prod) = production {
        direct = direct.min(prod.max(0.0));
    }
    if let Some(cons) = consumption {
        direct = direct.min(cons.max(0.0));
    }
    if let Some(prod) = production {
        charge = charge.min((prod - direct).max(0.0));
    }
    if let Some(cons) = consumption {
        discharge = discharge.min((cons - direct).max(0.0));
    }
    discharge = discharge.min(charge);

    let feed_in = match production {
        Some(prod) => Some((prod - direct - charge).max(0.0)),
        None => first_number(results, &["netzeinspeisung_kwh"]),
    };
    let grid = match consumption {
        Some(cons) => Some((cons - direct - discharge).max(0.0)),
        None => first_number(results, &["grid_bezug_kwh", "grid_purchase_kwh"]),
    };

    let kwh = |v: f64| fmt_number(Some(v), 0, "kWh");
    if direct != 0.0 {
        data.insert("direct_self_consumption_kwh", kwh(direct));
    }
    if charge != 0.0 {
        data.insert("battery_charge_kwh", kwh(charge));
    }
    if discharge != 0.0 {
        data.insert("battery_discharge_for_sc_kwh", kwh(discharge));
    }
    if let Some(feed) = feed_in {
        data.insert("grid_feed_in_kwh", kwh(feed));
    }
    if let Some(grid) = grid {
        data.insert("grid_bezug_kwh", kwh(grid));
    }
    if let Some(cons) = consumption {
        let from_pv = direct.clamp(0.0, cons.max(0.0));
        let from_battery = discharge.clamp(0.0, cons.max(0.0));
        data.insert("annual_consumption_kwh", kwh(cons));
        data.insert("consumption_direct_kwh", kwh(from_pv));
        data.insert("consumption_battery_kwh", kwh(from_battery));
        data.insert("consumption_grid_kwh", kwh((cons - from_pv - from_battery).max(0.0)));
    }
    if flows.storage_kwh.is_some() {
        data.insert("battery_note_text", BATTERY_NOTE);
    }

    if let Some(prod) = production.filter(|p| *p > 0.0) {
        let direct_share = direct.clamp(0.0, prod) / prod;
        let battery_share = charge.clamp(0.0, (prod - direct).max(0.0)) / prod;
        let partition = Partition::from_leading_shares(direct_share, battery_share);

        for entry in PRODUCTION_LABEL_SWAP {
            let value = share_of(&partition, entry.share);
            let text = if entry.percent_sign {
                format!("{value}%")
            } else {
                value.to_string()
            };
            data.insert(entry.slot, text);
        }

        let own_use = (partition.first + partition.second).min(100);
        data.insert("self_consumption_percent", format!("{own_use}%"));
    }

    if let Some(cons) = consumption.filter(|c| *c > 0.0) {
        let from_pv = direct.clamp(0.0, cons);
        let from_battery = discharge.clamp(0.0, cons);
        let from_grid = (cons - from_pv - from_battery).max(0.0);
        let partition = Partition::from_amounts(from_pv, from_battery, from_grid);

        data.insert("direct_cover_consumption_percent_number", partition.first.to_string());
        data.insert("battery_cover_consumption_percent", format!("{}%", partition.second));
        data.insert("grid_consumption_rate_percent", format!("{}%", partition.third));

        let autarky = (partition.first + partition.second).min(100);
        data.insert("self_supply_rate_percent", format!("{autarky}%"));
    }

    flows.production = production;
    flows.consumption = consumption;
    flows.direct = direct;
    flows.battery_charge = charge;
    flows.battery_discharge = discharge;
    flows.feed_in = feed_in;
    flows.grid_purchase = grid;
}
