//! quick start - invoice the first quarters of a lease
use lease_invoicing_rs::chrono::{NaiveDate, TimeZone, Utc};
use lease_invoicing_rs::{
    CalculationParameters, IndexValues, InvoiceCalculationSelection, InvoiceService, InvoiceStore, InvoiceView,
    Invoices, Lease, LeaseItemConfig, LeaseTerm, Money, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date");
    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2014, 1, 2, 9, 0, 0).single().ok_or("invalid time")?));

    // a lease with a plain service charge
    let mut lease = Lease::builder("OXF-POISON-003")
        .property("OXF")
        .unit("OXF-003")
        .landlord("HELLOWORLD")
        .tenant("POISON")
        .start_date(date(2014, 1, 1)?)
        .build()?;
    let sc = lease.new_item(LeaseItemConfig::service_charge("SERVICE_CHARGE"))?;
    lease.add_term(sc, LeaseTerm::fixed(date(2014, 1, 1)?, None, Money::from_major(12_000)))?;

    let mut invoices = Invoices::new();
    invoices.create_invoice_number_numerator("OXF", "OXF-%06d", 0)?;

    // invoice the first half year
    let params = CalculationParameters::normal_run(
        InvoiceCalculationSelection::AllItems,
        date(2014, 1, 1)?,
        date(2014, 1, 1)?,
        date(2014, 7, 1)?,
    );
    let mut service = InvoiceService::default();
    let result = service.calculate(&mut lease, &params, &IndexValues::new(), &mut invoices, &time)?;

    if let Some(id) = result.invoice_id {
        let invoice = invoices.approve(id, &time)?;
        println!("{}", InvoiceView::from_invoice(invoice).to_json_pretty()?);
    }

    Ok(())
}
