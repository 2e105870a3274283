//! Static label tables. Lookup falls back to English, then to the key itself.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::band::Band;
use crate::model::Language;

type Table = HashMap<&'static str, &'static str>;

static EN: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        ("stock", "Stock"),
        ("crypto", "Crypto"),
        ("currentIndex", "Current Index"),
        ("extremeFear", "Extreme Fear"),
        ("fear", "Fear"),
        ("neutral", "Neutral"),
        ("greed", "Greed"),
        ("extremeGreed", "Extreme Greed"),
        ("historicalData", "Historical Data"),
        ("previousClose", "Previous Close"),
        ("oneWeekAgo", "1 Week Ago"),
        ("oneMonthAgo", "1 Month Ago"),
        ("oneYearAgo", "1 Year Ago"),
        ("loading", "Loading..."),
        ("lastUpdated", "Last Updated"),
        ("cached", "Cached"),
        ("errorLoading", "Error loading data"),
        ("settings", "Settings"),
        ("launchAtLogin", "Launch at Login"),
        ("defaultIndexType", "Default Index Type"),
        ("stockMarket", "Stock Market"),
        ("cryptocurrency", "Cryptocurrency"),
        ("language", "Language"),
        ("english", "English"),
        ("korean", "한국어"),
        ("backToDashboard", "Back to Dashboard"),
        ("checkForUpdates", "Check for Updates"),
        ("checking", "Checking..."),
        ("upToDate", "Up to date"),
        ("updateAvailable", "Update available"),
        ("downloading", "Downloading..."),
        ("readyToInstall", "Ready to install"),
        ("updates", "Updates"),
    ])
});

static KO: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        ("stock", "주식"),
        ("crypto", "암호화폐"),
        ("currentIndex", "현재 지수"),
        ("extremeFear", "극도의 공포"),
        ("fear", "공포"),
        ("neutral", "중립"),
        ("greed", "탐욕"),
        ("extremeGreed", "극도의 탐욕"),
        ("historicalData", "과거 데이터"),
        ("previousClose", "전일 종가"),
        ("oneWeekAgo", "1주 전"),
        ("oneMonthAgo", "1개월 전"),
        ("oneYearAgo", "1년 전"),
        ("loading", "로딩 중..."),
        ("lastUpdated", "마지막 업데이트"),
        ("settings", "설정"),
        ("launchAtLogin", "로그인 시 실행"),
        ("defaultIndexType", "기본 지수 유형"),
        ("stockMarket", "주식 시장"),
        ("cryptocurrency", "암호화폐"),
        ("language", "언어"),
        ("english", "English"),
        ("korean", "한국어"),
        ("backToDashboard", "대시보드로 돌아가기"),
        ("checkForUpdates", "업데이트 확인"),
        ("checking", "확인 중..."),
        ("upToDate", "최신 버전"),
        ("updateAvailable", "업데이트 가능"),
        ("downloading", "다운로드 중..."),
        ("readyToInstall", "설치 준비 완료"),
        ("updates", "업데이트"),
    ])
});

fn table(lang: Language) -> &'static Table {
    match lang {
        Language::En => &EN,
        Language::Ko => &KO,
    }
}

pub fn t<'a>(lang: Language, key: &'a str) -> &'a str {
    table(lang)
        .get(key)
        .or_else(|| EN.get(key))
        .copied()
        .unwrap_or(key)
}

/// Translate one of the five canonical status labels; anything else is
/// returned untouched.
pub fn translate_status<'a>(status: &'a str, lang: Language) -> &'a str {
    match Band::from_label(status) {
        Some(band) => t(lang, band.i18n_key()),
        None => status,
    }
}
