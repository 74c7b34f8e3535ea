//! Printer name resolution
//!
//! Maps a caller-requested printer name onto what discovery actually sees.
//! Resolution never blocks a print attempt: every failure degrades to
//! passing the requested name through unresolved.

use crate::descriptor::PrinterDescriptor;
use crate::discovery::{NativeEnumeration, PrinterEnumeration, ShellEnumeration};
use tracing::{debug, info, instrument, warn};

/// Names containing one of these are assumed to be receipt printers, even
/// when the requested and discovered spellings differ.
const DOMAIN_KEYWORDS: [&str; 2] = ["pos", "thermal"];

/// Layered printer discovery and name resolution
pub struct PrinterResolver {
    strategies: Vec<Box<dyn PrinterEnumeration>>,
}

impl PrinterResolver {
    /// Create a resolver with an explicit strategy chain
    pub fn new(strategies: Vec<Box<dyn PrinterEnumeration>>) -> Self {
        Self { strategies }
    }

    /// Native platform API first, shell command second
    pub fn with_default_strategies() -> Self {
        Self::new(vec![
            Box::new(NativeEnumeration),
            Box::new(ShellEnumeration),
        ])
    }

    /// Discover printers, trying each strategy until one yields results
    ///
    /// Strategy errors are logged and treated as "zero printers found";
    /// this method never fails.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> Vec<PrinterDescriptor> {
        for strategy in &self.strategies {
            match strategy.enumerate().await {
                Ok(printers) if !printers.is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        count = printers.len(),
                        "printers discovered"
                    );
                    return printers;
                }
                Ok(_) => {
                    debug!(strategy = strategy.name(), "strategy found no printers");
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "enumeration strategy unavailable"
                    );
                }
            }
        }
        Vec::new()
    }

    /// Resolve a requested name to the string handed to the OS print API
    ///
    /// `None` means "use the system default printer". A requested name that
    /// cannot be matched against discovery is passed through unchanged:
    /// some printers accept jobs without appearing in enumeration.
    #[instrument(skip(self))]
    pub async fn resolve(&self, requested: Option<&str>) -> Option<String> {
        let requested = match requested {
            None => return None,
            Some(name) if name.is_empty() => return None,
            Some(name) => name,
        };

        let printers = self.discover().await;
        if printers.is_empty() {
            warn!(
                requested,
                "no printers discovered, passing requested name through"
            );
            return Some(requested.to_string());
        }

        match match_printer(requested, &printers) {
            Some(matched) => {
                if matched != requested {
                    info!(requested, matched, "printer name resolved");
                }
                Some(matched)
            }
            None => {
                warn!(
                    requested,
                    discovered = printers.len(),
                    "requested printer not in discovered list, passing through"
                );
                Some(requested.to_string())
            }
        }
    }
}

/// Match a requested name against discovered printers
///
/// Order: exact match, case-insensitive substring in either direction,
/// then the POS/thermal keyword heuristic.
fn match_printer(requested: &str, printers: &[PrinterDescriptor]) -> Option<String> {
    if printers.iter().any(|p| p.name == requested) {
        return Some(requested.to_string());
    }

    let requested_lower = requested.to_lowercase();
    for printer in printers {
        let candidate_lower = printer.name.to_lowercase();
        if candidate_lower.contains(&requested_lower) || requested_lower.contains(&candidate_lower)
        {
            return Some(printer.name.clone());
        }
    }

    if DOMAIN_KEYWORDS.iter().any(|k| requested_lower.contains(k)) {
        for printer in printers {
            let candidate_lower = printer.name.to_lowercase();
            if DOMAIN_KEYWORDS.iter().any(|k| candidate_lower.contains(k)) {
                return Some(printer.name.clone());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PrintError, PrintResult};
    use async_trait::async_trait;

    struct FixedList(Vec<&'static str>);

    #[async_trait]
    impl PrinterEnumeration for FixedList {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn enumerate(&self) -> PrintResult<Vec<PrinterDescriptor>> {
            Ok(self.0.iter().copied().map(PrinterDescriptor::new).collect())
        }
    }

    struct Failing;

    #[async_trait]
    impl PrinterEnumeration for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn enumerate(&self) -> PrintResult<Vec<PrinterDescriptor>> {
            Err(PrintError::Enumeration("simulated failure".to_string()))
        }
    }

    fn resolver(strategies: Vec<Box<dyn PrinterEnumeration>>) -> PrinterResolver {
        PrinterResolver::new(strategies)
    }

    #[tokio::test]
    async fn test_none_requested_means_system_default() {
        let r = resolver(vec![Box::new(FixedList(vec!["POS-58"]))]);
        assert_eq!(r.resolve(None).await, None);
        assert_eq!(r.resolve(Some("")).await, None);
    }

    #[tokio::test]
    async fn test_exact_match_wins() {
        let r = resolver(vec![Box::new(FixedList(vec!["POS-58 (USB001)"]))]);
        assert_eq!(
            r.resolve(Some("POS-58 (USB001)")).await,
            Some("POS-58 (USB001)".to_string())
        );
    }

    #[tokio::test]
    async fn test_substring_and_keyword_heuristic() {
        let r = resolver(vec![Box::new(FixedList(vec![
            "Generic / Text Only",
            "Kitchen Thermal",
        ]))]);
        assert_eq!(
            r.resolve(Some("thermal")).await,
            Some("Kitchen Thermal".to_string())
        );
    }

    #[tokio::test]
    async fn test_keyword_heuristic_across_spellings() {
        // No substring relation, but both sides carry a domain keyword
        let r = resolver(vec![Box::new(FixedList(vec![
            "HP LaserJet",
            "EPSON TM-T20 POS",
        ]))]);
        assert_eq!(
            r.resolve(Some("Thermal Receipt")).await,
            Some("EPSON TM-T20 POS".to_string())
        );
    }

    #[tokio::test]
    async fn test_unmatched_name_passes_through() {
        let r = resolver(vec![Box::new(FixedList(vec!["Office Laser"]))]);
        assert_eq!(
            r.resolve(Some("Receipt-X")).await,
            Some("Receipt-X".to_string())
        );
    }

    #[tokio::test]
    async fn test_enumeration_failure_passes_through() {
        let r = resolver(vec![Box::new(Failing)]);
        assert_eq!(
            r.resolve(Some("POS-58 (USB001)")).await,
            Some("POS-58 (USB001)".to_string())
        );
        assert!(r.discover().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_strategy_falls_through_to_next() {
        let r = resolver(vec![
            Box::new(Failing),
            Box::new(FixedList(vec!["POS-58"])),
        ]);
        let printers = r.discover().await;
        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].name, "POS-58");
    }
}
