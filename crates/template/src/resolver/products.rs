//! Page-4 product data sheets: module, inverter and storage

use super::energy::EnergyFlows;
use super::{first_number, first_text, lookup, DynamicData, GenerationRequest, Record};
use offer_format::{fmt_number, group_thousands};

const SEE_DATASHEET: &str = "siehe Produktdatenblatt";

const PRODUCT_KEYS: &[&str] = &[
    "module_manufacturer",
    "module_model",
    "module_power_wp",
    "module_power_per_panel_watt",
    "module_performance_warranty",
    "module_cell_technology",
    "module_structure",
    "module_cell_type",
    "module_version",
    "inverter_manufacturer",
    "inverter_model",
    "inverter_power_watt",
    "inverter_type",
    "inverter_phases",
    "inverter_max_efficiency_percent",
    "inverter_shading_management",
    "inverter_backup_capable",
    "inverter_smart_home_integration",
    "storage_manufacturer",
    "storage_model",
    "storage_size_battery_kwh_star",
    "storage_extension_module_size_kwh",
    "storage_max_size_kwh",
    "storage_power_kw",
    "storage_dod_percent",
    "storage_cycles",
    "storage_cell_technology",
    "storage_backup_text",
    "storage_outdoor_capability",
    "module_image_b64",
    "inverter_image_b64",
    "storage_image_b64",
    "module_brand_logo_b64",
    "inverter_brand_logo_b64",
    "storage_brand_logo_b64",
];

const WARRANTY_KEYS: &[&str] = &[
    "module_warranty_years",
    "module_guarantee_combined",
    "inverter_warranty_years",
    "inverter_guarantee_text",
    "storage_warranty_text",
];

/// Seed every page-4 key so unresolved slots render blank
pub(super) fn insert_defaults(data: &mut DynamicData) {
    for key in PRODUCT_KEYS {
        data.insert(*key, "");
    }
    for key in WARRANTY_KEYS {
        data.insert(*key, SEE_DATASHEET);
    }
}

fn product<'a>(project: &'a Record, kind: &str) -> Option<&'a Record> {
    lookup(project, &format!("products.{kind}"))?.as_object()
}

fn years(value: f64) -> String {
    format!("{} Jahre", value.round() as i64)
}

/// Brand, else the first word of the model name
fn manufacturer(item: &Record, model: Option<&str>) -> Option<String> {
    first_text(item, &["brand", "manufacturer"])
        .or_else(|| model.and_then(|m| m.split_whitespace().next()).map(str::to_string))
}

fn set_images(data: &mut DynamicData, item: &Record, prefix: &str) {
    if let Some(image) = first_text(item, &["image_base64"]) {
        data.insert(format!("{prefix}_image_b64"), image);
    }
    if let Some(logo) = first_text(item, &["brand_logo_base64"]) {
        data.insert(format!("{prefix}_brand_logo_b64"), logo);
    }
}

fn resolve_module(data: &mut DynamicData, item: &Record, flows: &EnergyFlows) {
    let title = match flows.module_count {
        Some(count) => format!("PHOTOVOLTAIK MODULE – {} Stück", fmt_number(Some(count), 0, "")),
        None => "PHOTOVOLTAIK MODULE".to_string(),
    };
    data.insert("module_section_title", title);

    let model = first_text(item, &["model_name", "model", "name"]);
    if let Some(name) = manufacturer(item, model.as_deref()) {
        data.insert("module_manufacturer", name);
    }
    if let Some(model) = model {
        data.insert("module_model", model);
    }

    if let Some(watts) = first_number(item, &["capacity_w", "power_wp"]) {
        data.insert("module_power_wp", fmt_number(Some(watts), 0, "Wp"));
        data.insert("module_power_per_panel_watt", fmt_number(Some(watts), 0, "Watt"));
    }

    let product_years = first_number(item, &["warranty_years"]);
    let performance_years = first_number(item, &["performance_warranty_years"]);
    if let Some(y) = product_years {
        data.insert("module_warranty_years", years(y));
    }
    if let Some(y) = performance_years {
        let percent = first_number(item, &["performance_warranty_percent"]);
        let text = match percent {
            Some(pct) => format!("{} / {} %", years(y), fmt_number(Some(pct), 0, "")),
            None => years(y),
        };
        data.insert("module_performance_warranty", text);
    }
    if let (Some(product_y), Some(perf_y)) = (product_years, performance_years) {
        data.insert(
            "module_guarantee_combined",
            format!(
                "{} Produktgarantie | {} Leistungsgarantie",
                years(product_y),
                years(perf_y)
            ),
        );
    }

    for (key, fields) in [
        ("module_cell_technology", &["cell_technology"][..]),
        ("module_structure", &["module_structure", "structure"][..]),
        ("module_cell_type", &["cell_type"][..]),
        ("module_version", &["version"][..]),
    ] {
        if let Some(text) = first_text(item, fields) {
            data.insert(key, text);
        }
    }

    set_images(data, item, "module");
}

fn resolve_inverter(data: &mut DynamicData, item: &Record, project: &Record, flows: &EnergyFlows) {
    let model = first_text(item, &["model_name", "model", "name"]);
    if let Some(name) = manufacturer(item, model.as_deref()) {
        data.insert("inverter_manufacturer", name);
    }

    let quantity = first_number(project, &["selected_inverter_quantity"])
        .or_else(|| first_number(item, &["quantity"]))
        .unwrap_or(1.0);
    if let Some(model) = &model {
        let text = if quantity > 1.0 {
            format!("{}x {model}", quantity.round() as i64)
        } else {
            model.clone()
        };
        data.insert("inverter_model", text);
    }

    let kw = first_number(item, &["power_kw"])
        .map(|kw| if kw > 100.0 { kw / 1000.0 } else { kw })
        .or(flows.inverter_kw);
    if let Some(kw) = kw {
        let watts = (kw * 1000.0).round() as u64;
        data.insert("inverter_power_watt", format!("{} W", group_thousands(watts, '.')));
        let phases = if kw >= 4.6 { "Dreiphasig" } else { "Einphasig" };
        data.insert("inverter_phases", phases);
    }

    let lowered = model.as_deref().unwrap_or_default().to_lowercase();
    let inverter_type = if lowered.contains("hybrid") {
        "Hybrid-Wechselrichter"
    } else if lowered.contains("string") {
        "String-Wechselrichter"
    } else if flows.has_storage() {
        "Hybrid-Wechselrichter"
    } else {
        "String-Wechselrichter"
    };
    data.insert("inverter_type", inverter_type);

    if let Some(pct) = first_number(item, &["efficiency_percent", "max_efficiency_percent"]) {
        data.insert("inverter_max_efficiency_percent", fmt_number(Some(pct), 1, "%"));
    }
    if let Some(y) = first_number(item, &["warranty_years"]) {
        data.insert("inverter_warranty_years", years(y));
        data.insert("inverter_guarantee_text", format!("{} Produktgarantie", years(y)));
    }

    data.insert("inverter_shading_management", "ja, vorhanden");
    data.insert("inverter_backup_capable", "ja, wenn Hauselektrik kompatibel");
    data.insert("inverter_smart_home_integration", "ja");

    set_images(data, item, "inverter");
}

fn resolve_storage(data: &mut DynamicData, item: &Record, flows: &EnergyFlows) {
    let model = first_text(item, &["model_name", "model", "name"]);
    if let Some(name) = manufacturer(item, model.as_deref()) {
        data.insert("storage_manufacturer", name);
    }
    if let Some(model) = model {
        data.insert("storage_model", model);
    }

    if let Some(kwh) = first_number(item, &["storage_power_kw", "capacity_kwh"]).or(flows.storage_kwh) {
        data.insert("storage_size_battery_kwh_star", fmt_number(Some(kwh), 2, "kWh"));
    }
    if let Some(kwh) = first_number(item, &["extension_module_kwh"]) {
        data.insert("storage_extension_module_size_kwh", fmt_number(Some(kwh), 2, "kWh"));
    }
    if let Some(kwh) = first_number(item, &["max_capacity_kwh", "max_kwh"]) {
        data.insert("storage_max_size_kwh", fmt_number(Some(kwh), 2, "kWh"));
    }
    if let Some(kw) = first_number(item, &["power_kw", "max_power_kw"]) {
        data.insert("storage_power_kw", fmt_number(Some(kw), 1, "kW"));
    }
    if let Some(dod) = first_number(item, &["dod_percent"]) {
        data.insert("storage_dod_percent", fmt_number(Some(dod), 0, "%"));
    }
    if let Some(cycles) = first_number(item, &["cycles", "max_cycles"]) {
        data.insert("storage_cycles", format!("{} cycles", fmt_number(Some(cycles), 0, "")));
    }

    let cell = first_text(item, &["cell_technology"])
        .unwrap_or_else(|| "Lithium-Eisenphosphat (LiFePO4)".to_string());
    data.insert("storage_cell_technology", cell);
    data.insert("storage_backup_text", "ja, dreiphasig");
    data.insert("storage_outdoor_capability", "Outdoorfähig");

    if let Some(y) = first_number(item, &["warranty_years"]) {
        data.insert("storage_warranty_text", format!("{} Produktgarantie", years(y)));
    }

    set_images(data, item, "storage");
}

pub(super) fn resolve(data: &mut DynamicData, request: &GenerationRequest, flows: &EnergyFlows) {
    let project = &request.project;

    match product(project, "module") {
        Some(item) => resolve_module(data, item, flows),
        None => resolve_module(data, &Record::new(), flows),
    }
    if let Some(item) = product(project, "inverter") {
        resolve_inverter(data, item, project, flows);
    }
    if let Some(item) = product(project, "storage") {
        resolve_storage(data, item, flows);
    }
}
