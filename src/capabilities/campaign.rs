use std::{collections::BTreeMap, fmt};

use tracing::info;

use super::PromptEnhancer;

/// The four assets every campaign produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CampaignAsset {
    Logo,
    InstagramPost,
    HeroImage,
    Avatar,
}

impl CampaignAsset {
    pub const ALL: [CampaignAsset; 4] = [
        CampaignAsset::Logo,
        CampaignAsset::InstagramPost,
        CampaignAsset::HeroImage,
        CampaignAsset::Avatar,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CampaignAsset::Logo => "logo",
            CampaignAsset::InstagramPost => "instagram_post",
            CampaignAsset::HeroImage => "hero_image",
            CampaignAsset::Avatar => "avatar",
        }
    }

    fn template(self, business_type: &str, colors: Option<&str>) -> String {
        let (head, tail) = match self {
            CampaignAsset::Logo => (
                format!("minimalist logo design for {business_type}"),
                "clean, professional, vector style",
            ),
            CampaignAsset::InstagramPost => (
                format!("Instagram post design for {business_type}"),
                "engaging, modern, social media optimized",
            ),
            CampaignAsset::HeroImage => (
                format!("hero banner image for {business_type} website"),
                "professional, engaging, wide format",
            ),
            CampaignAsset::Avatar => (
                format!("profile avatar for {business_type}"),
                "circular, clean, recognizable",
            ),
        };

        match colors {
            Some(colors) => format!("{head}, {colors}, {tail}"),
            None => format!("{head}, {tail}"),
        }
    }
}

impl fmt::Display for CampaignAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Marketing prompt batch built on top of the enhancer.
#[derive(Clone)]
pub struct CampaignBuilder {
    enhancer: PromptEnhancer,
}

impl CampaignBuilder {
    pub fn new(enhancer: PromptEnhancer) -> Self {
        Self { enhancer }
    }

    /// The unenhanced prompts, keyed by asset.
    pub fn templates(business_type: &str, brand_colors: &[String]) -> BTreeMap<CampaignAsset, String> {
        let colors = brand_colors
            .iter()
            .map(|color| color.trim())
            .filter(|color| !color.is_empty())
            .collect::<Vec<_>>();
        let colors = (!colors.is_empty()).then(|| format!("brand colors: {}", colors.join(", ")));

        CampaignAsset::ALL
            .into_iter()
            .map(|asset| (asset, asset.template(business_type, colors.as_deref())))
            .collect()
    }

    /// Enhances each template for marketing the business. An asset whose
    /// enhancement fails keeps its template; the batch always completes.
    pub async fn build_campaign(
        &self,
        business_type: &str,
        brand_colors: &[String],
    ) -> BTreeMap<CampaignAsset, String> {
        let target_use = format!("marketing for {business_type}");
        let mut prompts = BTreeMap::new();

        for (asset, template) in Self::templates(business_type, brand_colors) {
            let enhanced = self.enhancer.enhance(&template, &target_use).await;
            info!(target: "campaign", asset = %asset, "campaign prompt ready");
            prompts.insert(asset, enhanced);
        }

        prompts
    }
}
