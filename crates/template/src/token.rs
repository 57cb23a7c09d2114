//! Placeholder tokens and the literal-to-key table
//!
//! Template pages were authored with sample values ("Max Mustermann",
//! "8,4 kWp") at the positions dynamic values belong. The [`TokenMap`]
//! translates those literals to logical data keys. Newer templates name the
//! key directly with `{{key}}`.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Placeholder text of a coordinate record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `{{key}}`: names a data key directly
    Stable(&'a str),
    /// Sample literal, looked up in the token map
    Legacy(&'a str),
}

impl<'a> Token<'a> {
    pub fn parse(text: &'a str) -> Self {
        let stable = text
            .trim()
            .strip_prefix("{{")
            .and_then(|rest| rest.strip_suffix("}}"))
            .map(str::trim)
            .filter(|id| !id.is_empty());

        match stable {
            Some(id) => Token::Stable(id),
            None => Token::Legacy(text),
        }
    }

    /// Data key this token reads, if any
    pub fn key(&self) -> Option<&'a str> {
        match *self {
            Token::Stable(id) => Some(id),
            Token::Legacy(literal) => TokenMap::standard().key_for(literal),
        }
    }
}

/// Ordered table from sample literal to data key
#[derive(Debug)]
pub struct TokenMap {
    entries: Vec<(&'static str, &'static str)>,
    index: HashMap<&'static str, usize>,
}

impl TokenMap {
    /// Bumped whenever a registration changes
    pub const VERSION: u32 = 3;

    /// Build a table; a literal registered twice keeps its last key
    pub fn from_registrations(registrations: &[(&'static str, &'static str)]) -> Self {
        let mut entries: Vec<(&'static str, &'static str)> = Vec::new();
        let mut index = HashMap::new();

        for &(literal, key) in registrations {
            match index.get(literal) {
                Some(&pos) => entries[pos] = (literal, key),
                None => {
                    index.insert(literal, entries.len());
                    entries.push((literal, key));
                }
            }
        }

        Self { entries, index }
    }

    /// The table shipped with the offer templates
    pub fn standard() -> &'static TokenMap {
        &STANDARD
    }

    pub fn key_for(&self, literal: &str) -> Option<&'static str> {
        self.index.get(literal).map(|&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-registration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

lazy_static! {
    static ref STANDARD: TokenMap = TokenMap::from_registrations(REGISTRATIONS);
}

const REGISTRATIONS: &[(&str, &str)] = &[
    // Page 1: customer and KPIs
    ("qwe qe", "customer_name"),
    ("22359 Hamburg", "customer_city_zip"),
    ("Tel: 0155555555", "customer_phone"),
    ("oemertimur@gmail.com", "customer_email"),
    ("36.958,00 EUR*", "anlage_kwp"),
    ("29.150,00 EUR*", "amortization_time"),
    ("8,4 kWp", "anlage_kwp"),
    ("6,1 kWh", "storage_capacity_kwh"),
    ("8.251,92 kWh/Jahr", "annual_pv_production_kwh"),
    ("54%", "self_supply_rate_percent"),
    ("42%", "self_consumption_percent"),
    ("Auf den Wöörden 23", "customer_street"),
    // Company block
    ("TommaTech GmbH", "company_name"),
    ("Zeppelinstraße 14", "company_street"),
    ("85748 Garching b. München", "company_city_zip"),
    ("Tel: +49 89 1250 36 860", "company_phone"),
    ("mail@tommatech.de", "company_email"),
    // Page 1: component labels
    ("Heizung", "pv_modules_count_with_unit"),
    ("Warmwasser", "inverter_total_power_kw"),
    ("Verbrauch", "storage_capacity_kwh"),
    ("Dachneigung", "annual_feed_in_revenue_eur"),
    ("Solaranlage", "vat_amount_eur"),
    ("Batterie", "static_inklusive"),
    ("Jahresertrag", "static_inklusive"),
    ("DC Dachmontage", "static_dc_dachmontage"),
    ("AC Installation und Inbetriebnahme", "static_ac_installation"),
    ("AC Installation | Inbetriebnahme", "static_ac_installation"),
    // Footer
    ("tom-90", "footer_company"),
    ("29.11.2024", "footer_date"),
    // Page 2: energy flows
    ("8.251 kWh", "pv_prod_kwh_short"),
    ("1.945 kWh", "direct_self_consumption_kwh"),
    ("1.562 kWh", "battery_charge_kwh"),
    ("1.313 kWh", "battery_discharge_for_sc_kwh"),
    ("1.321 kWh", "battery_discharge_for_sc_kwh"),
    ("4.745 kWh", "grid_feed_in_kwh"),
    ("2.742 kWh", "grid_bezug_kwh"),
    ("6.000 kWh", "annual_consumption_kwh"),
    ("19%", "battery_use_quote_prod_percent"),
    ("58%", "direct_consumption_quote_prod_percent"),
    ("24", "feed_in_quote_prod_percent_number"),
    ("22%", "battery_cover_consumption_percent"),
    ("46%", "grid_consumption_rate_percent"),
    ("32", "direct_cover_consumption_percent_number"),
    ("Hinweis Batteriespeicher", "battery_note_text"),
    ("Direkter Verbrauch (kWh)", "consumption_direct_kwh"),
    ("Batteriespeicher (kWh)", "consumption_battery_kwh"),
    ("Netzbezug (kWh)", "consumption_grid_kwh"),
    // Page 3: costs and savings
    ("46.296,00 €", "cost_10y_no_increase_number"),
    ("58.230,61 €", "cost_10y_with_increase_number"),
    ("Direkt", "self_consumption_without_battery_eur"),
    ("Einspeisung", "annual_feed_in_revenue_eur"),
    ("Speichernutzung", "battery_usage_savings_eur"),
    ("Überschuss", "battery_surplus_feed_in_eur"),
    ("Gesamt", "total_annual_savings_eur"),
    ("Speicherladung (kWh)", "calc_battery_charge_kwh_page3"),
    ("Speichernutzung (kWh)", "calc_battery_discharge_kwh_page3"),
    ("Verbrauch 32 Cent", "basis_tariff_text"),
    ("NOSW", "orientation_text"),
    ("Deckung", "roof_covering_type"),
    ("Kredit", "financing_needed_text"),
    ("Neigung", "roof_inclination_text"),
    ("Art", "roof_type"),
    ("EEG", "feed_in_tariff_text"),
    ("Kapitalkosten sowie Investition und Unterhalt.", "annual_total_savings_year1_label"),
    (" Der interne Zinsfuß entspricht der mittleren, jährlichen", "total_annual_savings_eur"),
    ("Rendite Ihres Kapitals über die gesamte Laufzeit.", "rendite_line_2"),
    ("tom-90", "footer_company"),
    ("29.11.2024", "footer_date"),
    ("3", "page_number_with_total"),
    // Page 3: 10-year axis, old layout
    ("25.000", "axis_tick_1_top"),
    ("20.000", "axis_tick_2"),
    ("15.000", "axis_tick_3"),
    ("10.000", "axis_tick_4"),
    ("5.000", "axis_tick_5"),
    ("0", "axis_tick_6_bottom"),
    // Page 3: 10-year axis, current layout
    ("100.000", "axis_tick_1_top"),
    ("80.000", "axis_tick_2"),
    ("60.000", "axis_tick_3"),
    ("40.000", "axis_tick_4"),
    ("20.000", "axis_tick_5"),
    // Page 3: 20-year axis
    ("154.000,00", "axis20_tick_1_top"),
    ("123.200,00", "axis20_tick_2"),
    ("92.400,00", "axis20_tick_3"),
    ("61.600,00", "axis20_tick_4"),
    ("30.800,00", "axis20_tick_5"),
    ("0,00", "axis20_tick_6_bottom"),
    // Page 4: module
    ("Modul-Hersteller", "module_manufacturer"),
    ("Modul-Modell", "module_model"),
    ("Modul-Leistung", "module_power_wp"),
    ("Modul-Garantie", "module_warranty_years"),
    ("Modul-Leistungsgarantie", "module_performance_warranty"),
    // Page 4: inverter
    ("WR-Hersteller", "inverter_manufacturer"),
    ("WR-Wirkungsgrad", "inverter_max_efficiency_percent"),
    ("WR-Garantie", "inverter_warranty_years"),
    ("WR-Leistung (Titel)", "inverter_total_power_kw"),
    ("WR-Modell | Typ", "inverter_model"),
    ("WR-Leistung", "inverter_power_watt"),
    ("WR-Typ", "inverter_type"),
    ("WR-Phasen", "inverter_phases"),
    ("WR-Schattenmanagement", "inverter_shading_management"),
    ("WR-Notstrom", "inverter_backup_capable"),
    ("WR-Smart-Home", "inverter_smart_home_integration"),
    ("WR-Garantie-Text", "inverter_guarantee_text"),
    // Page 4: storage
    ("Speicher-Hersteller", "storage_manufacturer"),
    ("Speicher-Modell | Typ", "storage_model"),
    ("Speicher-Kapazität", "storage_capacity_kwh"),
    ("Speicher-Leistung", "storage_power_kw"),
    ("Speicher-Entladetiefe", "storage_dod_percent"),
    ("Speicher-Zyklen", "storage_cycles"),
    ("Speicherzellentechnologie", "storage_cell_technology"),
    ("Größe des Batteriespeichers", "storage_size_battery_kwh_star"),
    ("Erweiterungsmodul Größe", "storage_extension_module_size_kwh"),
    ("Speichergröße maximum", "storage_max_size_kwh"),
    ("Reserve bzw. Notstrom", "storage_backup_text"),
    ("Outdoorfähig", "storage_outdoor_capability"),
    ("Speicher-Garantie-Text", "storage_warranty_text"),
    ("Speicherkapazität (Titel)", "storage_capacity_kwh"),
    // Page 4: section titles
    ("SOLARMODULE", "module_section_title"),
    ("PHOTOVOLTAIK MODULE", "module_section_title"),
    ("WECHSELRICHTER", "inverter_section_title"),
    ("BATTERIESPEICHER", "storage_section_title"),
    // Page 4: module details
    ("Leistung pro PV-Modul", "module_power_per_panel_watt"),
    ("PV-Zellentechnologie1", "module_cell_technology"),
    ("Modulaufbau1", "module_structure"),
    ("Solarzellen1", "module_cell_type"),
    ("Version1", "module_version"),
    ("Modul-Garantie1", "module_guarantee_combined"),
    ("siehe Produktdatenblatt", "module_guarantee_combined"),
    // Page 4: brand logos
    ("Logomodul", "module_brand_logo_b64"),
    ("Logoricht", "inverter_brand_logo_b64"),
    ("Logoakkus", "storage_brand_logo_b64"),
];
