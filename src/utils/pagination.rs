// ============================================================================
// PAGINATION
// ============================================================================
//
// Paramètres: ?page=<n> (1-based) & ?limit=<taille de page>
// Réponse:    {"count", "next", "previous", "results"}
//   - next/previous : URL absolue de la page voisine, ou null
//   - page hors limites -> 404 {"detail": "Invalid page."}
//   - limit invalide ou < 1 -> taille par défaut, plafonnée à MAX_PAGE_SIZE
//
// ============================================================================

use actix_web::HttpRequest;
use serde::Serialize;
use url::Url;

use crate::error::AppError;

/// Paramètres de query string, clés répétables (?tags=a&tags=b)
#[derive(Debug, Clone, Default)]
pub struct QueryParams(pub Vec<(String, String)>);

impl QueryParams {
    pub fn from_request(req: &HttpRequest) -> Self {
        Self(
            url::form_urlencoded::parse(req.query_string().as_bytes())
                .into_owned()
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// "1" / "true" -> true
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("1") | Some("true") | Some("True"))
    }
}

pub const MAX_PAGE_SIZE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn from_params(params: &QueryParams, default_limit: u64) -> Result<Self, AppError> {
        let limit = params
            .get("limit")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|limit| *limit >= 1)
            .unwrap_or(default_limit)
            .min(MAX_PAGE_SIZE);

        let page = match params.get("page") {
            None => 1,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(invalid_page)?,
        };

        Ok(Self { page, limit })
    }

    /// Index 0-based pour le Paginator SeaORM
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }

    /// Une page > 1 vide n'existe pas (un offset qui déborde non plus)
    pub fn check_in_range(&self, count: u64) -> Result<(), AppError> {
        if self.page == 1 {
            return Ok(());
        }
        match (self.page - 1).checked_mul(self.limit) {
            Some(offset) if offset < count => Ok(()),
            _ => Err(invalid_page()),
        }
    }
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".to_string())
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: &HttpRequest, params: &QueryParams, page: PageRequest, count: u64, results: Vec<T>) -> Self {
        let info = req.connection_info();
        let base = format!("{}://{}{}", info.scheme(), info.host(), req.path());
        Self::with_base(&base, params, page, count, results)
    }

    pub fn with_base(base: &str, params: &QueryParams, page: PageRequest, count: u64, results: Vec<T>) -> Self {
        let has_next = page
            .page
            .checked_mul(page.limit)
            .is_some_and(|seen| seen < count);
        let next = has_next.then(|| page_url(base, params, Some(page.page + 1)));

        // Le lien vers la page 1 ne porte pas de paramètre page
        let previous = match page.page {
            1 => None,
            2 => Some(page_url(base, params, None)),
            n => Some(page_url(base, params, Some(n - 1))),
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Reconstruit l'URL courante en remplaçant (ou retirant) le paramètre page
pub fn page_url(base: &str, params: &QueryParams, page: Option<u64>) -> String {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(_) => return base.to_string(),
    };

    let mut pairs: Vec<(String, String)> = params
        .0
        .iter()
        .filter(|(k, _)| k != "page")
        .cloned()
        .collect();
    if let Some(page) = page {
        pairs.push(("page".to_string(), page.to_string()));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}
