//! retro run - credit notes after an early termination
use lease_invoicing_rs::chrono::{NaiveDate, TimeZone, Utc};
use lease_invoicing_rs::{
    CalculationParameters, IndexValues, InvoiceCalculationSelection, InvoiceService, InvoiceStore, InvoiceView,
    Invoices, LeaseItemConfig, LeaseRepository, LeaseTerm, Leases, Lease, Money, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date");
    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2014, 7, 15, 9, 0, 0).single().ok_or("invalid time")?));

    let mut leases = Leases::new();
    let lease = leases.add(
        Lease::builder("OXF-TOPMODEL-001")
            .property("OXF")
            .unit("OXF-001")
            .landlord("HELLOWORLD")
            .tenant("TOPMODEL")
            .start_date(date(2014, 1, 1)?)
            .build()?,
    )?;
    let rent = lease.new_item(LeaseItemConfig::rent("RENT", "ISTAT-FOI"))?;
    lease.add_term(rent, LeaseTerm::fixed(date(2014, 1, 1)?, None, Money::from_major(120_000)))?;

    let mut invoices = Invoices::new();
    invoices.create_invoice_number_numerator("OXF", "OXF-%06d", 0)?;
    let indices = IndexValues::new();
    let mut service = InvoiceService::default();

    // the whole of 2014 is invoiced and approved
    let normal = CalculationParameters::normal_run(
        InvoiceCalculationSelection::AllItems,
        date(2014, 1, 1)?,
        date(2014, 1, 1)?,
        date(2015, 1, 1)?,
    );
    let lease = leases.find_by_reference_mut("OXF-TOPMODEL-001")?;
    let result = service.calculate(lease, &normal, &indices, &mut invoices, &time)?;
    if let Some(id) = result.invoice_id {
        invoices.approve(id, &time)?;
    }

    // the tenant leaves at the end of august
    lease.terminate(date(2014, 8, 31)?, &time)?;
    let retro = CalculationParameters::retro_run(
        InvoiceCalculationSelection::AllItems,
        date(2014, 9, 1)?,
        date(2014, 1, 1)?,
        date(2015, 1, 1)?,
    );
    let credit = service.calculate(lease, &retro, &indices, &mut invoices, &time)?;
    println!("credited: {}", credit.total());

    if let Some(id) = credit.invoice_id {
        println!("{}", InvoiceView::from_invoice(invoices.invoice(id)?).to_json_pretty()?);
    }

    Ok(())
}
