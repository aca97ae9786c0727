//! indexation - rent escalated with the ISTAT index
use lease_invoicing_rs::chrono::{NaiveDate, TimeZone, Utc};
use lease_invoicing_rs::{
    Decimal, Indexation, IndexationCalculator, IndexValues, Lease, LeaseItemConfig, LeaseItemView, LeaseTerm,
    Money, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date");
    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2015, 1, 15, 9, 0, 0).single().ok_or("invalid time")?));

    let mut lease = Lease::builder("OXF-MIRACL-005")
        .property("OXF")
        .unit("OXF-005")
        .landlord("HELLOWORLD")
        .tenant("MIRACLE")
        .start_date(date(2013, 11, 7)?)
        .build()?;
    let rent = lease.new_item(LeaseItemConfig::rent("ITA_RENT", "ISTAT-FOI"))?;
    lease.add_term(
        rent,
        LeaseTerm::indexable(
            date(2013, 11, 7)?,
            Some(date(2014, 12, 31)?),
            Money::from_major(150_000),
            Indexation::monthly(date(2013, 11, 1)?, None)?,
        ),
    )?;

    let mut indices = IndexValues::new();
    indices.new_index_value("ISTAT-FOI", date(2013, 11, 1)?, Decimal::from(110))?;

    // the december reading is missing, the 2015 term stays at its base value
    let calculator = IndexationCalculator::default();
    let report = lease.verify_until(date(2015, 12, 31)?, &indices, &calculator, &time)?;
    println!("terms created: {}, pending: {}", report.created_terms.len(), report.pending().count());

    indices.new_index_value("ISTAT-FOI", date(2014, 12, 1)?, Decimal::from(115))?;
    lease.verify_until(date(2015, 12, 31)?, &indices, &calculator, &time)?;

    println!("{}", LeaseItemView::from_item(lease.item(rent)?).to_json_pretty()?);
    for event in lease.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
