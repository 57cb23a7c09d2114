//! Customer, company and footer fields

use super::{first_text, join_nonempty, DynamicData, GenerationRequest, Record};
use chrono::NaiveDate;
use offer_format::offer_date_label;

/// Title values that mean "no title"
const EMPTY_TITLES: &[&str] = &["(kein)", "keine", "none", "null"];

fn text(record: &Record, key: &str) -> String {
    first_text(record, &[key]).unwrap_or_default()
}

/// Salutation, title, first and last name
pub(crate) fn full_name(customer: &Record) -> String {
    let title = text(customer, "title");
    let title = if EMPTY_TITLES.contains(&title.to_lowercase().as_str()) {
        String::new()
    } else {
        title
    };

    join_nonempty(&[
        text(customer, "salutation"),
        title,
        text(customer, "first_name"),
        text(customer, "last_name"),
    ])
}

pub(super) fn resolve(data: &mut DynamicData, request: &GenerationRequest, today: NaiveDate) {
    let customer = &request.customer;
    let company = &request.company;
    let name = full_name(customer);

    data.insert("customer_name", name.clone());
    data.insert(
        "customer_street",
        join_nonempty(&[text(customer, "address"), text(customer, "house_number")]),
    );
    data.insert(
        "customer_city_zip",
        join_nonempty(&[text(customer, "zip_code"), text(customer, "city")]),
    );
    data.insert(
        "customer_phone",
        first_text(customer, &["phone_mobile", "phone_landline"]).unwrap_or_default(),
    );
    data.insert("customer_email", text(customer, "email"));

    data.insert("company_name", text(company, "name"));
    data.insert("company_street", text(company, "street"));
    data.insert(
        "company_city_zip",
        join_nonempty(&[text(company, "zip_code"), text(company, "city")]),
    );
    data.insert("company_phone", text(company, "phone"));
    data.insert("company_email", text(company, "email"));
    data.insert("company_website", text(company, "website"));
    data.insert("company_logo_b64", text(company, "logo_base64"));

    data.insert("footer_company", name);
    data.insert("footer_date", offer_date_label(today));
}
