//! Amazon best-seller selectors

use crate::traits::SiteSelectors;

fn chain(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_string()).collect()
}

/// Selector set for the Amazon best-seller pages and product detail pages
pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        sign_in: "#nav-link-accountList".to_string(),
        email_input: "#ap_email, #ap_email_login".to_string(),
        continue_button: "#continue".to_string(),
        password_input: "#ap_password".to_string(),
        sign_in_submit: "#signInSubmit".to_string(),
        logged_in_marker: "#nav-link-accountList-nav-line-1".to_string(),

        category_banner: chain(&["#zg_banner_text", "h1#zg_banner_text span"]),
        banner_suffix: " Best Sellers".to_string(),
        listing_row: "div[class*='zg-grid-general-faceout']".to_string(),
        row_name: chain(&[
            "div[class*='p13n-sc-truncate-desktop-type2']",
            "div[class*='_cDEzb_p13n-sc-css-line-clamp-']",
        ]),
        row_link: chain(&["a[class*='a-link-normal'][href*='/dp/']", "a[href*='/dp/']"]),
        next_page_item: "li.a-last".to_string(),
        next_page_link: "li.a-last a".to_string(),
        disabled_class: "a-disabled".to_string(),

        price_whole: chain(&[
            "#corePriceDisplay_desktop_feature_div span.a-price-whole",
            "span.a-price-whole",
        ]),
        price_fraction: chain(&[
            "#corePriceDisplay_desktop_feature_div span.a-price-fraction",
            "span.a-price-fraction",
        ]),
        original_price: chain(&[
            "span.a-text-price span.a-offscreen",
            "span.a-price.a-text-price span[aria-hidden='true']",
        ]),
        sales_rank: chain(&[
            "#SalesRank",
            "#detailBulletsWrapper_feature_div",
            "#productDetails_detailBullets_sections1",
        ]),
        ship_from: chain(&[
            "#tabular-buybox-container .tabular-buybox-text",
            "#fulfillerInfoFeature_feature_div .offer-display-feature-text",
        ]),
        sold_by: chain(&["#merchant-info", "#sellerProfileTriggerId"]),
        rating: chain(&["#acrPopover"]),
        rating_text: chain(&["#acrPopover span.a-icon-alt", "#averageCustomerReviews span.a-icon-alt"]),
        description: chain(&["#productDescription", "#feature-bullets"]),
        bought_past_month: chain(&[
            "#social-proofing-faceout-title",
            "#social-proofing-faceout-title-tk_bought",
        ]),

        gallery_images: "#altImages li.imageThumbnail img, #altImages li.a-spacing-small.item img"
            .to_string(),
        main_image: "#landingImage, #imgBlkFront".to_string(),
        swatch_images: "#variation_color_name img, #color_name_0 img".to_string(),
    }
}
