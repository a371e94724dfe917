mod support;

use jobwatch_core::{extract_job, PostedDate, SiteConfig};
use pretty_assertions::assert_eq;
use support::{init_logging, FakeNode, BROKEN_SELECTOR};
use url::Url;

fn base() -> Url {
    Url::parse("https://jobs.example.com/search?q=devops").unwrap()
}

fn site() -> SiteConfig {
    SiteConfig::new("Example", "https://jobs.example.com/search", "div.card", "h2 a")
        .with_description_selector("div.desc")
        .with_tags_selector("span.tag")
        .with_date_selector("div.date")
}

fn devops_card() -> FakeNode {
    FakeNode::new("div")
        .class("card")
        .child(
            FakeNode::new("h2").child(
                FakeNode::new("a")
                    .attr("href", "/jobs/42")
                    .text("DevOps Engineer"),
            ),
        )
        .child(
            FakeNode::new("div")
                .class("desc")
                .text("  Run our cloud platform.  "),
        )
        .child(FakeNode::new("span").class("tag").text(" Full Time "))
        .child(FakeNode::new("span").class("tag").text("Remote"))
        .child(FakeNode::new("span").class("tag").text("   "))
        .child(FakeNode::new("span").class("tag").text("Full Time"))
        .child(FakeNode::new("div").class("date").text(" 3 days ago "))
}

#[test]
fn extracts_all_fields_from_a_well_formed_card() {
    init_logging();
    let record = extract_job(&devops_card(), &site(), Some(&base())).expect("record");

    assert_eq!(record.title, "DevOps Engineer");
    assert_eq!(record.link, "https://jobs.example.com/jobs/42");
    assert_eq!(record.description, "Run our cloud platform.");
    assert_eq!(record.tags, vec!["Full Time".to_string(), "Remote".to_string()]);
    assert_eq!(record.source, "Example");
    assert_eq!(record.posted_date, PostedDate::raw("3 days ago"));
}

#[test]
fn title_anchor_href_wins_when_link_selector_misses() {
    init_logging();
    let site = site().with_link_selector("a.apply");
    let card = devops_card().attr("href", "/cards/should-not-be-used");
    let card = FakeNode::new("a")
        .attr("href", "/cards/should-not-be-used")
        .child(card);

    let record = extract_job(&card, &site, Some(&base())).expect("record");
    assert_eq!(record.link, "https://jobs.example.com/jobs/42");
}

#[test]
fn dedicated_link_selector_comes_first() {
    init_logging();
    let site = site().with_link_selector("a.apply");
    let card = devops_card().child(FakeNode::new("a").class("apply").attr("href", "/apply/42"));

    let record = extract_job(&card, &site, Some(&base())).expect("record");
    assert_eq!(record.link, "https://jobs.example.com/apply/42");
}

#[test]
fn nested_anchor_inside_title_is_used() {
    init_logging();
    let site = SiteConfig::new("Example", "https://x", "div.card", "h3");
    let card = FakeNode::new("div").child(
        FakeNode::new("h3").child(FakeNode::new("a").attr("href", "https://other.example.org/p/1").text("SRE")),
    );

    let record = extract_job(&card, &site, Some(&base())).expect("record");
    assert_eq!(record.title, "SRE");
    assert_eq!(record.link, "https://other.example.org/p/1");
}

#[test]
fn card_anchor_is_the_last_resort() {
    init_logging();
    let site = SiteConfig::new("Example", "https://x", "a.card", "h3");
    let card = FakeNode::new("a")
        .class("card")
        .attr("href", "/jobs/7")
        .child(FakeNode::new("h3").text("Cloud Engineer"));

    let record = extract_job(&card, &site, Some(&base())).expect("record");
    assert_eq!(record.link, "https://jobs.example.com/jobs/7");
}

#[test]
fn unresolvable_hrefs_fall_through_to_the_next_strategy() {
    init_logging();
    let site = SiteConfig::new("Example", "https://x", "a.card", "h3 a");
    let card = FakeNode::new("a").attr("href", "/jobs/9").child(
        FakeNode::new("h3").child(FakeNode::new("a").attr("href", "javascript:void(0)").text("SRE")),
    );

    let record = extract_job(&card, &site, Some(&base())).expect("record");
    assert_eq!(record.link, "https://jobs.example.com/jobs/9");
}

#[test]
fn card_without_title_yields_nothing() {
    init_logging();
    let card = FakeNode::new("div").child(FakeNode::new("a").attr("href", "/jobs/1"));
    assert_eq!(extract_job(&card, &site(), Some(&base())), None);

    let blank_title = FakeNode::new("div")
        .child(FakeNode::new("h2").child(FakeNode::new("a").attr("href", "/jobs/1").text("   ")));
    assert_eq!(extract_job(&blank_title, &site(), Some(&base())), None);
}

#[test]
fn card_without_any_link_yields_nothing() {
    init_logging();
    let card = FakeNode::new("div").child(FakeNode::new("h2").child(FakeNode::new("span").text("DevOps")));
    let site = SiteConfig::new("Example", "https://x", "div", "h2");
    assert_eq!(extract_job(&card, &site, Some(&base())), None);
}

#[test]
fn relative_link_without_base_is_unresolvable() {
    init_logging();
    assert_eq!(extract_job(&devops_card(), &site(), None), None);
}

#[test]
fn a_bad_card_does_not_stop_its_siblings() {
    init_logging();
    let cards = vec![
        devops_card(),
        FakeNode::new("div").child(FakeNode::new("p").text("advert")),
        devops_card(),
    ];
    let records: Vec<_> = cards
        .iter()
        .filter_map(|card| extract_job(card, &site(), Some(&base())))
        .collect();
    assert_eq!(records.len(), 2);
}

#[test]
fn backend_failure_on_title_skips_only_that_card() {
    init_logging();
    let site = SiteConfig::new("Example", "https://x", "div", BROKEN_SELECTOR);
    assert_eq!(extract_job(&devops_card(), &site, Some(&base())), None);
}

#[test]
fn optional_fields_degrade_to_defaults() {
    init_logging();
    let site = SiteConfig::new("Example", "https://x", "div.card", "h2 a")
        .with_description_selector(BROKEN_SELECTOR)
        .with_tags_selector(BROKEN_SELECTOR)
        .with_date_selector(BROKEN_SELECTOR);

    let record = extract_job(&devops_card(), &site, Some(&base())).expect("record");
    assert_eq!(record.description, "");
    assert!(record.tags.is_empty());
    assert_eq!(record.posted_date, PostedDate::Recently);
}

#[test]
fn missing_or_empty_date_becomes_recently() {
    init_logging();
    let no_selector = SiteConfig::new("Example", "https://x", "div.card", "h2 a");
    let record = extract_job(&devops_card(), &no_selector, Some(&base())).expect("record");
    assert_eq!(record.posted_date, PostedDate::Recently);
    assert_eq!(record.posted_date.to_string(), "Recently");

    let absent = site().with_date_selector("time.posted");
    let record = extract_job(&devops_card(), &absent, Some(&base())).expect("record");
    assert_eq!(record.posted_date, PostedDate::Recently);
}

#[test]
fn time_element_keeps_its_datetime_attribute() {
    init_logging();
    let site = site().with_date_selector("time");
    let card = devops_card().child(
        FakeNode::new("time")
            .attr("datetime", "2024-07-01T08:30:00")
            .text("2 weeks ago"),
    );

    let record = extract_job(&card, &site, Some(&base())).expect("record");
    assert_eq!(
        record.posted_date,
        PostedDate::Raw {
            text: "2 weeks ago".to_string(),
            datetime_attr: Some("2024-07-01T08:30:00".to_string()),
        }
    );
}
