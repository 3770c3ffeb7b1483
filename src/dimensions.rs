use serde_json::Value;

use crate::models::CompanyRecord;

/// Everything that distinguishes one evaluation axis from another.
#[derive(Debug)]
pub struct Dimension {
    pub name: &'static str,
    /// One-line description shown next to the score on the site.
    pub summary: &'static str,
    pub rubric: &'static str,
    /// Company fields the model sees for this dimension.
    pub fields: &'static [&'static str],
    /// Search templates; `{name}` and `{industry}` are filled from the record.
    pub queries: &'static [&'static str],
    pub calibration: &'static [(i64, &'static [&'static str])],
}

impl Dimension {
    /// Project a company onto this dimension's fields, dropping absent and null values.
    pub fn trim(&self, company: &CompanyRecord) -> CompanyRecord {
        self.fields
            .iter()
            .filter_map(|field| {
                company
                    .get(*field)
                    .filter(|value| !value.is_null())
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn search_queries(&self, company: &CompanyRecord) -> Vec<String> {
        let name = text_field(company, "name");
        let industry = text_field(company, "industry");
        self.queries
            .iter()
            .map(|template| {
                template
                    .replace("{name}", name)
                    .replace("{industry}", industry)
                    .trim()
                    .to_string()
            })
            .collect()
    }

    pub fn calibration_examples(&self, score: i64) -> &'static [&'static str] {
        self.calibration
            .iter()
            .find(|(bucket, _)| *bucket == score)
            .map(|(_, examples)| *examples)
            .unwrap_or(&[])
    }
}

fn text_field<'a>(company: &'a CompanyRecord, field: &str) -> &'a str {
    company.get(field).and_then(Value::as_str).unwrap_or("")
}

pub fn find(name: &str) -> Option<&'static Dimension> {
    ALL.iter().find(|dimension| dimension.name == name)
}

pub static ALL: [Dimension; 7] = [
    FOUNDER_EDGE,
    NOVEL_WEDGE,
    CUSTOMER_SIGNAL,
    SALES_MOTION,
    MOAT_POTENTIAL,
    INVESTOR_BEHAVIOR,
    INCUMBENT_BLIND_SPOT,
];

pub const FOUNDER_EDGE: Dimension = Dimension {
    name: "Founder Edge",
    summary: "Assesses the founder's unique advantages, such as domain expertise, network, or execution skills, compared to others in the space.",
    rubric: "Definition:
Founder Edge is the unique combination of factors that give a founder an advantage over other founders in the same space. The following are examples of Founder Edges:
- Deep domain expertise
- Prior startup/operating experience in the same space
- Significant network access to potential customers, investors, talent and partners
- Strong personal brand
- Fundraising credibility
- Unique cultural fit
- Exceptional execution skills
- Unique technical insights
- Unique customer acquisition insights

Use this rubric:
- 1: No clear advantage
- 2: Mild advantage
- 3: Clear domain edge
- 4: Strong & unique edge (repeat founder, elite fit)
- 5: Legendary, category-defining edge (multiple exits, ex-CEO of market leader, or unique proprietary advantage)",
    fields: &[
        "name",
        "summary",
        "employee_count",
        "employee_count_by_role",
        "average_tenure_by_level",
        "funding_details",
        "linkedin_url",
        "twitter_url",
    ],
    queries: &[
        "{name} founders background experience",
        "{name} founding team",
        "{name} CEO linkedin",
        "{name} founders previous startups",
    ],
    calibration: &[
        (1, &[
            "Team of recent graduates with no industry experience",
            "Solo founder from unrelated industry (e.g., restaurant owner starting a SaaS company)",
            "Consultants with no direct experience in the space",
        ]),
        (2, &[
            "Product manager from adjacent industry",
            "Technical founder with general experience but no domain expertise",
            "Former junior employee at competitor",
        ]),
        (3, &[
            "Former VP of Product at target customer company",
            "Serial founder with success in adjacent space",
            "Domain expert with 10+ years experience",
        ]),
        (4, &[
            "Repeat founder who sold previous company in same space",
            "Former CTO of market leader starting competing product",
            "Founder with unique insight from running target customer company",
        ]),
        (5, &[
            "Founder with multiple exits in the same category",
            "Former CEO of the market leader",
            "Proprietary advantage no other team can replicate",
        ]),
    ],
};

pub const NOVEL_WEDGE: Dimension = Dimension {
    name: "Novel Wedge",
    summary: "Evaluates how unique or timely the company's insight, product, or go-to-market angle is, and whether it leverages a new market opportunity.",
    rubric: "Definition:
Novel Wedge refers to the uniqueness or timeliness of the company's insight, product, or go-to-market angle. It measures whether the company is entering the market with a differentiated problem framing or solution that wasn't previously viable due to technical, cultural, regulatory, or timing-based unlocks.

Evaluation Criteria:
- Timing: Is this the right moment for this solution?
- Market Change: Has there been a recent shift that makes this possible?
- Problem Novelty: Is this a newly emerging pain point? And what is that emerging pain point?
- Solution Fit: Does the solution uniquely address the new market conditions?

Use this rubric:
- 1: No clear novel wedge
- 2: Mild novelty in approach
- 3: Clear novel wedge with timing advantage
- 4: Strong & unique wedge with perfect timing
- 5: Category-defining innovation with no clear precedent or unmatched technical/business model leap",
    fields: &[
        "name",
        "summary",
        "founded",
        "industry",
        "headline",
        "website",
        "linkedin_url",
    ],
    queries: &[
        "{name} unique value proposition",
        "{name} competitive advantage {industry}",
        "{name} market positioning",
        "{name} product differentiation",
    ],
    calibration: &[
        (1, &[
            "Direct copy of existing solution",
            "Minor UI improvements to existing product",
            "No clear differentiation from incumbents",
        ]),
        (2, &[
            "Incremental improvement on existing solution",
            "New interface but same underlying approach",
            "Cost advantage but no technical innovation",
        ]),
        (3, &[
            "Novel technical approach to known problem",
            "Unique go-to-market strategy in mature space",
            "New business model that reduces friction",
        ]),
        (4, &[
            "Revolutionary technology enabling new capabilities",
            "First to market with solution made possible by recent change",
            "Unique insight that transforms industry economics",
        ]),
        (5, &[
            "New category with no clear precedent",
            "Technical leap competitors cannot match for years",
            "Business model that redefines how the market buys",
        ]),
    ],
};

pub const CUSTOMER_SIGNAL: Dimension = Dimension {
    name: "Customer Signal",
    summary: "Measures public evidence of real demand, such as customer growth, reviews, or retention, indicating the product solves a meaningful pain.",
    rubric: "Definition:
Customer Signal reflects market validation. It includes public signals of real demand, such as adoption, engagement, review sentiment, or customer hiring patterns, that indicate the product solves a meaningful pain.

Evaluation Criteria:
- Public Reviews: Quality and sentiment of customer reviews
- Growth Patterns: Customer and revenue growth trends
- Hiring Patterns: Team expansion and role distribution
- Retention Signals: Customer churn and expansion metrics

Use this rubric:
- 1: No clear customer signals
- 2: Some positive signals
- 3: Strong customer validation
- 4: Exceptional market pull and rapid expansion
- 5: Explosive, category-leading growth and dominant market share",
    fields: &[
        "name",
        "summary",
        "employee_count",
        "employee_count_by_month",
        "inferred_revenue",
        "employee_growth_rate",
        "linkedin_follower_count",
    ],
    queries: &[
        "{name} customer reviews",
        "{name} customer growth",
        "{name} client testimonials",
        "{name} market traction",
    ],
    calibration: &[
        (1, &[
            "No paying customers yet",
            "Only friends and family using product",
            "High churn rate with no retention",
        ]),
        (2, &[
            "Few pilot customers but no expansion",
            "Paying customers but slow growth",
            "Mixed customer feedback",
        ]),
        (3, &[
            "Strong retention metrics",
            "Rapid customer acquisition in target segment",
            "Clear evidence of product-market fit",
        ]),
        (4, &[
            "Viral adoption with negative CAC",
            "Industry leaders as reference customers",
            "Exceptional NPS with rapid expansion",
        ]),
        (5, &[
            "Dominant share of the target market",
            "Customers expanding faster than the sales team can hire",
            "Category-leading revenue growth",
        ]),
    ],
};

pub const SALES_MOTION: Dimension = Dimension {
    name: "Sales Motion",
    summary: "Looks at the efficiency and repeatability of the company's go-to-market approach, including sales model and scalability.",
    rubric: "Definition:
Sales Motion refers to the efficiency and repeatability of the company's go-to-market approach. It includes how the company acquires customers (e.g., product-led, outbound, enterprise), the simplicity of onboarding, and the GTM team structure.

Evaluation Criteria:
- Sales Model: Product-led, SMB, Enterprise, etc.
- Efficiency: Customer acquisition cost and sales cycle
- Scalability: Ability to grow without proportional cost increase
- Channel Fit: Alignment with target market

Use this rubric:
- 1: No clear sales motion
- 2: Basic sales process
- 3: Repeatable motion with strong win rates
- 4: Highly efficient & scalable sales engine
- 5: Self-sustaining, viral sales engine with industry-leading efficiency and growth",
    fields: &[
        "name",
        "summary",
        "employee_count_by_role",
        "size",
        "employee_count",
        "inferred_revenue",
    ],
    queries: &[
        "{name} sales strategy",
        "{name} go to market",
        "{name} customer acquisition",
        "{name} sales team structure",
    ],
    calibration: &[
        (1, &[
            "No repeatable sales process",
            "Random deals with no pattern",
            "No clear target customer profile",
        ]),
        (2, &[
            "Basic sales process but long cycles",
            "Some deals but high CAC",
            "Inconsistent win rates",
        ]),
        (3, &[
            "Efficient sales process with predictable pipeline",
            "Strong win rates in target segment",
            "Clear ICP with repeatable motion",
        ]),
        (4, &[
            "Viral product-led growth with negative CAC",
            "Highly efficient enterprise sales motion",
            "Perfect channel-market fit with rapid scaling",
        ]),
        (5, &[
            "Self-sustaining growth loop with minimal sales spend",
            "Industry-leading efficiency at scale",
            "Customers recruit the next customers",
        ]),
    ],
};

pub const MOAT_POTENTIAL: Dimension = Dimension {
    name: "Moat Potential",
    summary: "Assesses how defensible the business could become over time through technology, data, network effects, or switching costs.",
    rubric: "Definition:
Moat Potential refers to how defensible the business could become over time. This includes lock-in through workflows, proprietary data, network effects, integrations, or switching costs, not just early traction.

Evaluation Criteria:
- Technical Depth: Complexity and uniqueness of solution
- Data Advantage: Accumulation of valuable data
- Network Effects: User or data network benefits
- Switching Costs: Barriers to customer migration

Use this rubric:
- 1: No clear moat
- 2: Basic defensibility
- 3: Strong moat potential (network effects, proprietary tech, or high switching costs)
- 4: Dominant, multi-layered moat with high barriers to entry
- 5: Unassailable market position with multiple reinforcing moats and global standard status",
    fields: &[
        "name",
        "summary",
        "industry",
        "technologies",
        "employee_count_by_role",
        "average_employee_tenure",
    ],
    queries: &[
        "{name} competitive moat",
        "{name} technology stack",
        "{name} patents intellectual property",
        "{name} market barriers entry {industry}",
    ],
    calibration: &[
        (1, &[
            "Easily replicable solution",
            "No proprietary technology",
            "No network effects or switching costs",
        ]),
        (2, &[
            "Basic technical barriers",
            "Some data advantage but not unique",
            "Moderate switching costs",
        ]),
        (3, &[
            "Strong network effects emerging",
            "Significant proprietary technology",
            "High switching costs with platform lock-in",
        ]),
        (4, &[
            "Dominant network effect with winner-take-all dynamics",
            "Revolutionary protected technology",
            "Ecosystem lock-in with high data barriers",
        ]),
        (5, &[
            "Product is the industry standard",
            "Several moats that reinforce each other",
            "Competitors build on top of the platform instead of against it",
        ]),
    ],
};

pub const INVESTOR_BEHAVIOR: Dimension = Dimension {
    name: "Investor Behavior",
    summary: "Reflects the quality and strategic fit of the company's investors, and their commitment to supporting future growth.",
    rubric: "Definition:
Investor Behavior captures the strength and strategic alignment of the company's funding sources. It reflects whether top-tier, experienced, or market-specific investors have backed the business, and at what stage.

Evaluation Criteria:
- Investor Quality: Reputation and track record
- Strategic Alignment: Investor expertise in space
- Funding Terms: Valuation and deal structure
- Follow-on Support: Investor commitment to future rounds

Use this rubric:
- 1: No strong investor interest
- 2: Basic investor support
- 3: Strong investor backing and multiple rounds
- 4: Top-tier or strategic investors with exceptional social proof
- 5: Multiple top-tier VCs competing, oversubscribed rounds, and global flagship status",
    fields: &[
        "name",
        "funding_details",
        "latest_funding_stage",
        "total_funding_raised",
        "last_funding_date",
        "number_funding_rounds",
    ],
    queries: &[
        "{name} funding rounds",
        "{name} investors",
        "{name} venture capital",
        "{name} investment news",
    ],
    calibration: &[
        (1, &[
            "No institutional investors",
            "Only friends and family funding",
            "Unable to raise follow-on rounds",
        ]),
        (2, &[
            "Some angel investors but no leads",
            "Small seed round from generalist investors",
            "Struggling to raise next round",
        ]),
        (3, &[
            "Strong tier-2 VC backing",
            "Strategic investors in space",
            "Multiple rounds with up-rounds",
        ]),
        (4, &[
            "Top-tier VC leading all rounds",
            "Strategic bidding war for rounds",
            "Exceptional investor social proof",
        ]),
        (5, &[
            "Several top-tier firms competing for allocation",
            "Oversubscribed rounds at rising valuations",
            "Flagship portfolio company for its lead investors",
        ]),
    ],
};

pub const INCUMBENT_BLIND_SPOT: Dimension = Dimension {
    name: "Incumbent Blind Spot",
    summary: "Evaluates whether large competitors are unlikely or unable to pursue the same wedge due to structural or strategic reasons.",
    rubric: "Definition:
Incumbent Blind Spot evaluates whether large players are structurally unable or unlikely to pursue the same wedge. This could be due to pricing conflicts, legacy architecture, org incentives, or brand risk.

Evaluation Criteria:
- Market Gap: Unaddressed customer needs
- Incumbent Constraints: Why can't they respond?
- Timing Window: How long before they might react?
- Defensive Position: How to maintain advantage

Use this rubric:
- 1: No clear blind spot
- 2: Mild opportunity, incumbents could easily respond
- 3: Clear blind spot with structural barriers
- 4: Significant, lasting advantage with high barriers to response
- 5: Incumbents are forced to retreat, partner, or acquire; disruption is systemic and sustained",
    fields: &[
        "name",
        "summary",
        "industry",
        "competitors",
        "employee_count",
        "inferred_revenue",
        "size",
    ],
    queries: &[
        "{name} market disruption",
        "{name} competitive landscape {industry}",
        "{name} industry innovation",
        "{name} market opportunity",
    ],
    calibration: &[
        (1, &[
            "Incumbents already building similar solution",
            "Easy for large players to copy",
            "No structural barriers to incumbent entry",
        ]),
        (2, &[
            "Incumbents aware but slow to respond",
            "Some organizational barriers",
            "Limited time advantage",
        ]),
        (3, &[
            "Clear structural barriers for incumbents",
            "Strong first-mover advantage in new category",
            "Significant organizational conflicts",
        ]),
        (4, &[
            "Fundamental disruption incumbents cannot pursue",
            "Perfect timing with high barriers to response",
            "Structural inability for incumbents to compete",
        ]),
        (5, &[
            "Incumbents partnering with or acquiring the company",
            "Incumbents retreating from the segment",
            "Disruption that rewrites the industry's economics",
        ]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn company() -> CompanyRecord {
        json!({
            "name": "Acme Robotics",
            "industry": "logistics",
            "summary": "Warehouse picking robots",
            "funding_details": [{"round": "Seed", "amount": 2000000}],
            "latest_funding_stage": null,
            "website": "https://acme.example",
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn trim_keeps_only_present_dimension_fields() {
        let trimmed = INVESTOR_BEHAVIOR.trim(&company());
        let keys: Vec<&String> = trimmed.keys().collect();
        assert_eq!(keys, ["name", "funding_details"]);
    }

    #[test]
    fn trim_of_unrelated_record_is_empty() {
        let record = json!({"headcount": 12}).as_object().unwrap().clone();
        assert!(FOUNDER_EDGE.trim(&record).is_empty());
    }

    #[test]
    fn queries_fill_name_and_industry() {
        let queries = NOVEL_WEDGE.search_queries(&company());
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0], "Acme Robotics unique value proposition");
        assert_eq!(queries[1], "Acme Robotics competitive advantage logistics");
    }

    #[test]
    fn missing_industry_leaves_no_trailing_space() {
        let record = json!({"name": "Acme"}).as_object().unwrap().clone();
        let queries = MOAT_POTENTIAL.search_queries(&record);
        assert_eq!(queries[3], "Acme market barriers entry");
    }

    #[test]
    fn every_dimension_has_calibration_for_default_range() {
        for dimension in &ALL {
            for score in 1..=5 {
                assert!(
                    !dimension.calibration_examples(score).is_empty(),
                    "{} lacks examples for {score}",
                    dimension.name
                );
            }
            assert!(dimension.calibration_examples(0).is_empty());
            assert!(dimension.fields.contains(&"name"));
        }
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("Sales Motion").unwrap().name, "Sales Motion");
        assert!(find("Vibes").is_none());
    }
}
