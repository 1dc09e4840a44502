//! Built-in API definitions registered at startup.

use std::collections::BTreeMap;

use serde_json::json;

use super::definition::{
    ApiDefinition, ApiEndpoint, ApiParameter, AuthType, HttpMethod, ParamType, RateLimit,
};

fn endpoint(name: &str, method: HttpMethod, path: &str, description: &str) -> ApiEndpoint {
    ApiEndpoint {
        name: name.to_string(),
        description: description.to_string(),
        path: path.to_string(),
        method,
        parameters: Vec::new(),
        query_params: Vec::new(),
        body_params: Vec::new(),
        headers: BTreeMap::new(),
    }
}

fn rate_limit(requests: u32, window: &str) -> Option<RateLimit> {
    Some(RateLimit {
        requests,
        window: window.to_string(),
    })
}

/// All built-in definitions
#[must_use]
pub fn definitions() -> Vec<ApiDefinition> {
    vec![
        coingecko(),
        openweather(),
        jsonplaceholder(),
        restcountries(),
        github(),
    ]
}

fn coingecko() -> ApiDefinition {
    use ParamType::{Boolean, String as Text};

    ApiDefinition {
        id: "coingecko".to_string(),
        name: "CoinGecko".to_string(),
        description: "Cryptocurrency prices, market data and trending coins".to_string(),
        base_url: "https://api.coingecko.com/api/v3".to_string(),
        requires_auth: false,
        auth_type: None,
        auth_header_name: None,
        auth_query_param: None,
        rate_limit: rate_limit(30, "minute"),
        common_headers: BTreeMap::new(),
        endpoints: vec![
            ApiEndpoint {
                query_params: vec![
                    ApiParameter::required("ids", Text, "Comma-separated coin ids (e.g. bitcoin,ethereum)"),
                    ApiParameter::required("vs_currencies", Text, "Comma-separated target currencies (e.g. usd,eur)"),
                    ApiParameter::optional("include_market_cap", Boolean, "Include market capitalisation"),
                    ApiParameter::optional("include_24hr_change", Boolean, "Include 24h price change"),
                ],
                ..endpoint("simple_price", HttpMethod::Get, "/simple/price", "Current price of one or more coins")
            },
            ApiEndpoint {
                parameters: vec![ApiParameter::required("id", Text, "Coin id (e.g. bitcoin)")],
                query_params: vec![
                    ApiParameter::required("vs_currency", Text, "Target currency (e.g. usd)"),
                    ApiParameter::required("days", Text, "Data up to number of days ago (1, 7, 30, max)"),
                ],
                ..endpoint("coin_market_chart", HttpMethod::Get, "/coins/{id}/market_chart", "Historical market data for a coin")
            },
            ApiEndpoint {
                parameters: vec![ApiParameter::required("id", Text, "Coin id (e.g. bitcoin)")],
                ..endpoint("coin_details", HttpMethod::Get, "/coins/{id}", "Metadata and market data for a coin")
            },
            endpoint("trending", HttpMethod::Get, "/search/trending", "Trending coins in the last 24 hours"),
        ],
    }
}

fn openweather() -> ApiDefinition {
    use ParamType::{Number, String as Text};

    let location = || {
        vec![
            ApiParameter::optional("q", Text, "City name, optionally with country code (e.g. London,UK)"),
            ApiParameter::optional("lat", Number, "Latitude"),
            ApiParameter::optional("lon", Number, "Longitude"),
            ApiParameter::optional("units", Text, "Unit system")
                .with_enum(["standard", "metric", "imperial"]),
        ]
    };

    ApiDefinition {
        id: "openweather".to_string(),
        name: "OpenWeatherMap".to_string(),
        description: "Current weather and forecasts for any location".to_string(),
        base_url: "https://api.openweathermap.org/data/2.5".to_string(),
        requires_auth: true,
        auth_type: Some(AuthType::Query),
        auth_header_name: None,
        auth_query_param: Some("appid".to_string()),
        rate_limit: rate_limit(60, "minute"),
        common_headers: BTreeMap::new(),
        endpoints: vec![
            ApiEndpoint {
                query_params: location(),
                ..endpoint("current_weather", HttpMethod::Get, "/weather", "Current weather for a city or coordinates")
            },
            ApiEndpoint {
                query_params: {
                    let mut params = location();
                    params.push(ApiParameter::optional("cnt", Number, "Number of 3-hour steps to return"));
                    params
                },
                ..endpoint("forecast", HttpMethod::Get, "/forecast", "5 day forecast in 3-hour steps")
            },
        ],
    }
}

fn jsonplaceholder() -> ApiDefinition {
    use ParamType::{Number, String as Text};

    let post_id = || vec![ApiParameter::required("id", Number, "Post id")];

    ApiDefinition {
        id: "jsonplaceholder".to_string(),
        name: "JSONPlaceholder".to_string(),
        description: "Fake REST API for testing and prototyping (posts, comments, users)".to_string(),
        base_url: "https://jsonplaceholder.typicode.com".to_string(),
        requires_auth: false,
        auth_type: None,
        auth_header_name: None,
        auth_query_param: None,
        rate_limit: None,
        common_headers: BTreeMap::new(),
        endpoints: vec![
            ApiEndpoint {
                query_params: vec![ApiParameter::optional("userId", Number, "Only posts by this user")],
                ..endpoint("get_posts", HttpMethod::Get, "/posts", "List posts")
            },
            ApiEndpoint {
                parameters: post_id(),
                ..endpoint("get_post", HttpMethod::Get, "/posts/{id}", "Fetch a single post")
            },
            ApiEndpoint {
                parameters: post_id(),
                ..endpoint("get_comments", HttpMethod::Get, "/posts/{id}/comments", "Comments on a post")
            },
            ApiEndpoint {
                body_params: vec![
                    ApiParameter::required("title", Text, "Post title"),
                    ApiParameter::required("body", Text, "Post body"),
                    ApiParameter::required("userId", Number, "Author id"),
                ],
                ..endpoint("create_post", HttpMethod::Post, "/posts", "Create a post (not persisted)")
            },
            endpoint("get_users", HttpMethod::Get, "/users", "List users"),
        ],
    }
}

fn restcountries() -> ApiDefinition {
    use ParamType::{Boolean, String as Text};

    let fields = || ApiParameter::optional("fields", Text, "Comma-separated fields to return");

    ApiDefinition {
        id: "restcountries".to_string(),
        name: "REST Countries".to_string(),
        description: "Country information: capitals, currencies, languages, population".to_string(),
        base_url: "https://restcountries.com/v3.1".to_string(),
        requires_auth: false,
        auth_type: None,
        auth_header_name: None,
        auth_query_param: None,
        rate_limit: None,
        common_headers: BTreeMap::new(),
        endpoints: vec![
            ApiEndpoint {
                query_params: vec![fields()],
                ..endpoint("all", HttpMethod::Get, "/all", "All countries")
            },
            ApiEndpoint {
                parameters: vec![ApiParameter::required("name", Text, "Common or official name")],
                query_params: vec![
                    ApiParameter::optional("fullText", Boolean, "Match the full name exactly"),
                    fields(),
                ],
                ..endpoint("by_name", HttpMethod::Get, "/name/{name}", "Search countries by name")
            },
            ApiEndpoint {
                parameters: vec![ApiParameter::required("code", Text, "ISO 3166-1 alpha-2 or alpha-3 code")],
                query_params: vec![fields()],
                ..endpoint("by_code", HttpMethod::Get, "/alpha/{code}", "Country by ISO code")
            },
            ApiEndpoint {
                parameters: vec![
                    ApiParameter::required("region", Text, "Region name")
                        .with_enum(["africa", "americas", "asia", "europe", "oceania"]),
                ],
                query_params: vec![fields()],
                ..endpoint("by_region", HttpMethod::Get, "/region/{region}", "Countries in a region")
            },
        ],
    }
}

fn github() -> ApiDefinition {
    use ParamType::{Number, String as Text};

    let repo = || {
        vec![
            ApiParameter::required("owner", Text, "Repository owner"),
            ApiParameter::required("repo", Text, "Repository name"),
        ]
    };

    ApiDefinition {
        id: "github".to_string(),
        name: "GitHub".to_string(),
        description: "Public GitHub data: users, repositories, issues and code search".to_string(),
        base_url: "https://api.github.com".to_string(),
        // Anonymous access works; a token only raises the rate limit.
        requires_auth: false,
        auth_type: Some(AuthType::Bearer),
        auth_header_name: None,
        auth_query_param: None,
        rate_limit: rate_limit(60, "hour"),
        common_headers: BTreeMap::from([
            ("Accept".to_string(), "application/vnd.github+json".to_string()),
            ("User-Agent".to_string(), "anyapi-hub".to_string()),
        ]),
        endpoints: vec![
            ApiEndpoint {
                parameters: vec![ApiParameter::required("username", Text, "GitHub login")],
                ..endpoint("get_user", HttpMethod::Get, "/users/{username}", "Public profile of a user")
            },
            ApiEndpoint {
                parameters: repo(),
                ..endpoint("get_repo", HttpMethod::Get, "/repos/{owner}/{repo}", "Repository metadata")
            },
            ApiEndpoint {
                parameters: repo(),
                query_params: vec![
                    ApiParameter::optional("state", Text, "Issue state")
                        .with_enum(["open", "closed", "all"])
                        .with_default(json!("open")),
                    ApiParameter::optional("per_page", Number, "Results per page (max 100)"),
                ],
                ..endpoint("list_repo_issues", HttpMethod::Get, "/repos/{owner}/{repo}/issues", "Issues of a repository")
            },
            ApiEndpoint {
                query_params: vec![
                    ApiParameter::required("q", Text, "Search query (GitHub search syntax)"),
                    ApiParameter::optional("sort", Text, "Sort field")
                        .with_enum(["stars", "forks", "help-wanted-issues", "updated"]),
                    ApiParameter::optional("per_page", Number, "Results per page (max 100)"),
                ],
                ..endpoint("search_repositories", HttpMethod::Get, "/search/repositories", "Search repositories")
            },
        ],
    }
}
