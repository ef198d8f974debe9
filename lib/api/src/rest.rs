use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use phenorank_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::service::{DetectOutcome, PhenotypeService, RankOutcome};

#[derive(Serialize)]
struct SearchTerm {
    #[serde(rename = "HPO Term")]
    term: String,
    #[serde(rename = "HPO ID")]
    id: String,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    symptoms: Vec<String>,
    #[serde(default)]
    frequency: Vec<String>,
}

#[derive(Serialize)]
struct RankedDisease {
    #[serde(rename = "MIM")]
    mim: String,
    #[serde(rename = "Disease")]
    disease: String,
    #[serde(rename = "Similarity Score")]
    score: f64,
}

#[derive(Deserialize)]
struct SymptomsRequest {
    #[serde(default)]
    symptoms: Vec<String>,
}

#[derive(Serialize)]
struct SuggestedTerm {
    #[serde(rename = "HPO ID")]
    id: String,
    #[serde(rename = "HPO Term")]
    term: String,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(service: Arc<PhenotypeService>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(service.clone()))
                .configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every endpoint; expects `web::Data<Arc<PhenotypeService>>` in app data
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/search_symptoms/{prefix}", web::get().to(search_symptoms))
        .route("/analyze_symptoms", web::post().to(analyze_symptoms))
        .route("/suggest_symptoms", web::post().to(suggest_symptoms))
        .route("/detect_disease", web::post().to(detect_disease))
        .route("/status", web::get().to(status))
        .route("/reload", web::post().to(reload));
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({
        "error": e.to_string()
    });
    if e.is_client_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

async fn search_symptoms(
    service: web::Data<Arc<PhenotypeService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let prefix = path.into_inner();

    match service.prefix_search(&prefix) {
        Ok(matches) => {
            let terms: Vec<SearchTerm> = matches
                .into_iter()
                .map(|m| SearchTerm {
                    term: m.term,
                    id: m.phenotype_id,
                })
                .collect();
            Ok(HttpResponse::Ok().json(terms))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn analyze_symptoms(
    service: web::Data<Arc<PhenotypeService>>,
    req: web::Json<AnalyzeRequest>,
) -> ActixResult<HttpResponse> {
    let AnalyzeRequest { symptoms, frequency } = req.into_inner();
    let service = service.get_ref().clone();

    // scoring is CPU-bound, keep it off the request threads
    let outcome = web::block(move || service.rank_diseases(&symptoms, &frequency)).await?;

    match outcome {
        Ok(RankOutcome::NoMatches) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "No matching diseases found"
        }))),
        Ok(RankOutcome::Ranking(ranking)) => {
            let diseases: Vec<RankedDisease> = ranking
                .into_iter()
                .map(|c| RankedDisease {
                    mim: c.disease_id,
                    disease: c.display_name,
                    score: c.score,
                })
                .collect();
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "disease_ranking": diseases
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn suggest_symptoms(
    service: web::Data<Arc<PhenotypeService>>,
    req: web::Json<SymptomsRequest>,
) -> ActixResult<HttpResponse> {
    let symptoms = req.into_inner().symptoms;
    let service = service.get_ref().clone();

    let outcome = web::block(move || service.suggest_phenotypes(&symptoms)).await?;

    match outcome {
        Ok(suggestions) => {
            let terms: Vec<SuggestedTerm> = suggestions
                .into_iter()
                .map(|s| SuggestedTerm {
                    id: s.phenotype_id,
                    term: s.term,
                })
                .collect();
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "suggestions": terms
            })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn detect_disease(
    service: web::Data<Arc<PhenotypeService>>,
    req: web::Json<SymptomsRequest>,
) -> ActixResult<HttpResponse> {
    let symptoms = req.into_inner().symptoms;
    let service = service.get_ref().clone();

    match web::block(move || service.detect_diseases(&symptoms)).await? {
        Ok(DetectOutcome::NoMatches) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "No matching diseases found"
        }))),
        Ok(DetectOutcome::Matches(counts)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "matching_diseases": counts
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn status(service: web::Data<Arc<PhenotypeService>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.status()))
}

async fn reload(service: web::Data<Arc<PhenotypeService>>) -> ActixResult<HttpResponse> {
    let service = service.get_ref().clone();

    match web::block(move || service.reload()).await? {
        Ok(status) => Ok(HttpResponse::Ok().json(status)),
        Err(e) => Ok(error_response(&e)),
    }
}
