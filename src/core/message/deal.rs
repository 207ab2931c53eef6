//! Deals of the `DealList`

use super::fields::{
    deal_terms_order, first_text, first_texts, insert_ordered, text_at, texts_at,
    RELEASE_DEAL_ORDER,
};
use crate::core::node::Element;
use crate::core::version::SchemaVersion;
use serde::{Deserialize, Serialize};

/// Commercial terms of one `Deal`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealTerms {
    pub commercial_model_types: Vec<String>,
    pub use_types: Vec<String>,
    pub territories: Vec<String>,
    /// Start of validity (`StartDate` or `StartDateTime`)
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DealTerms {
    /// Terms for one commercial model and use type, worldwide
    pub fn new(commercial_model_type: impl Into<String>, use_type: impl Into<String>) -> Self {
        Self {
            commercial_model_types: vec![commercial_model_type.into()],
            use_types: vec![use_type.into()],
            territories: vec!["Worldwide".to_string()],
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_territory(mut self, territory: impl Into<String>) -> Self {
        self.territories.push(territory.into());
        self
    }

    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn with_end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    fn from_deal(deal: &Element) -> Self {
        let Some(terms) = deal.child("DealTerms") else {
            return Self::default();
        };
        let owned = |texts: Vec<&str>| -> Vec<String> { texts.into_iter().map(str::to_string).collect() };
        Self {
            commercial_model_types: owned(texts_at(terms, &["CommercialModelType"])),
            use_types: owned(first_texts(terms, &[&["UseType"], &["Usage", "UseType"]])),
            territories: owned(texts_at(terms, &["TerritoryCode"])),
            start_date: first_text(
                terms,
                &[&["ValidityPeriod", "StartDate"], &["ValidityPeriod", "StartDateTime"]],
            )
            .map(str::to_string),
            end_date: first_text(
                terms,
                &[&["ValidityPeriod", "EndDate"], &["ValidityPeriod", "EndDateTime"]],
            )
            .map(str::to_string),
        }
    }

    fn to_deal(&self, version: SchemaVersion) -> Element {
        let order = deal_terms_order(version);
        let mut terms = Element::new("DealTerms");
        fn text(name: &str, value: &str) -> Element {
            Element::text_element(None, name, value)
        }
        for territory in &self.territories {
            insert_ordered(&mut terms, text("TerritoryCode", territory), order);
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            let mut period = Element::new("ValidityPeriod");
            if let Some(start) = &self.start_date {
                period = period.with_child(text("StartDate", start));
            }
            if let Some(end) = &self.end_date {
                period = period.with_child(text("EndDate", end));
            }
            insert_ordered(&mut terms, period, order);
        }
        for model in &self.commercial_model_types {
            insert_ordered(&mut terms, text("CommercialModelType", model), order);
        }
        if version.is_4x() {
            for use_type in &self.use_types {
                insert_ordered(&mut terms, text("UseType", use_type), order);
            }
        } else if !self.use_types.is_empty() {
            let mut usage = Element::new("Usage");
            for use_type in &self.use_types {
                usage = usage.with_child(text("UseType", use_type));
            }
            insert_ordered(&mut terms, usage, order);
        }
        Element::new("Deal").with_child(terms)
    }
}

/// A `ReleaseDeal`: the deals offered for one or more releases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    element: Element,
    version: SchemaVersion,
}

element_access!(Deal);

impl Deal {
    /// Create a `ReleaseDeal` for `release_reference`
    pub fn new(release_reference: impl Into<String>, version: SchemaVersion) -> Self {
        let mut deal = Self {
            element: Element::new("ReleaseDeal"),
            version,
        };
        deal.add_release_reference(release_reference);
        deal
    }

    /// Wrap a parsed `ReleaseDeal` element
    pub fn from_element(element: Element, version: SchemaVersion) -> Self {
        Self { element, version }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// `DealReleaseReference`s in document order
    pub fn release_references(&self) -> Vec<&str> {
        texts_at(&self.element, &["DealReleaseReference"])
    }

    pub fn add_release_reference(&mut self, reference: impl Into<String>) {
        insert_ordered(
            &mut self.element,
            Element::text_element(None, "DealReleaseReference", reference),
            RELEASE_DEAL_ORDER,
        );
    }

    /// Terms of every `Deal`, in document order
    pub fn terms(&self) -> Vec<DealTerms> {
        self.element
            .children_named("Deal")
            .map(DealTerms::from_deal)
            .collect()
    }

    /// Append a `Deal` with `terms`
    pub fn add_terms(&mut self, terms: &DealTerms) {
        insert_ordered(
            &mut self.element,
            terms.to_deal(self.version),
            RELEASE_DEAL_ORDER,
        );
    }

    pub fn effective_date(&self) -> Option<&str> {
        text_at(&self.element, &["EffectiveDate"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_round_trip_through_element() {
        let terms = DealTerms::new("SubscriptionModel", "Stream").with_start_date("2024-01-01");
        for version in SchemaVersion::ALL {
            let mut deal = Deal::new("R1", version);
            deal.add_terms(&terms);
            assert_eq!(deal.release_references(), vec!["R1"]);
            assert_eq!(deal.terms(), vec![terms.clone()]);
        }
    }

    #[test]
    fn test_ern43_terms_layout() {
        let mut deal = Deal::new("R1", SchemaVersion::Ern43);
        deal.add_terms(&DealTerms::new("PayAsYouGoModel", "PermanentDownload").with_start_date("2024-01-01"));
        let terms = deal.element().find(&["Deal", "DealTerms"]).unwrap();
        let names: Vec<_> = terms.child_elements().map(|e| e.local_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["TerritoryCode", "ValidityPeriod", "CommercialModelType", "UseType"]
        );
    }

    #[test]
    fn test_ern382_usage_wrapper() {
        let mut deal = Deal::new("R1", SchemaVersion::Ern382);
        deal.add_terms(&DealTerms::new("AdvertisementSupportedModel", "OnDemandStream"));
        let terms = deal.element().find(&["Deal", "DealTerms"]).unwrap();
        let names: Vec<_> = terms.child_elements().map(|e| e.local_name.as_str()).collect();
        assert_eq!(names, vec!["CommercialModelType", "Usage", "TerritoryCode"]);
    }
}
