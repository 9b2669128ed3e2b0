//! Rule-based assistant
//!
//! Answers free-text questions from a fixed decision list: greeting, coin
//! card, canned explainers, then answers backed by the live snapshot. The
//! first rule that matches wins. It never fails and never calls out.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::market::{analyze_market, MarketReport, Sentiment};
use crate::model::{fixed, round_half_up, AssetRecord};

macro_rules! re {
    ($pat:expr) => {
        LazyLock::new(|| Regex::new($pat).unwrap())
    };
}

static RE_GREETING: LazyLock<Regex> = re!(r"^(?:hi|hello|hey|greetings|good morning|good evening)\b");
static RE_WHAT: LazyLock<Regex> = re!(r"what is|what are|what's|define|explain|tell me about");
static RE_HOW: LazyLock<Regex> = re!(r"how to|how do|how does|how can");
static RE_WHY: LazyLock<Regex> = re!(r"why is|why are|why does|why should");
static RE_WHEN: LazyLock<Regex> = re!(r"when to|when should|when is|best time");
static RE_SHOULD: LazyLock<Regex> = re!(r"should i|should we|is it good|worth it");

static RE_BLOCKCHAIN: LazyLock<Regex> = re!(r"blockchain|distributed ledger|decentralized");
static RE_MINING: LazyLock<Regex> = re!(r"\b(?:mining|miners|hash rate|proof of work|pow)\b");
static RE_STAKING: LazyLock<Regex> = re!(r"\b(?:staking|stake|proof of stake|pos|validator)\b");
static RE_WALLET: LazyLock<Regex> = re!(r"wallet|metamask");
static RE_DEFI: LazyLock<Regex> = re!(r"defi|decentralized finance|yield farming|liquidity pool");
static RE_NFT: LazyLock<Regex> = re!(r"\bnfts?\b|non-fungible|collectible|opensea");
static RE_TRADE: LazyLock<Regex> = re!(r"\b(?:buy|sell|purchase|trade|order)\b");
static RE_VOLATILE: LazyLock<Regex> = re!(r"volatile|volatility|price swing");
static RE_BUY_OR_INVEST: LazyLock<Regex> = re!(r"\b(?:buy|invest)");
static RE_SECURITY: LazyLock<Regex> = re!(r"security|\bhack|\bscam|phishing|\bsafe\b|secure");
static RE_TAX: LazyLock<Regex> = re!(r"\btax|capital gains|\birs\b|reporting");
static RE_STRATEGY: LazyLock<Regex> = re!(r"strateg|trading|invest|portfolio");
static RE_ANALYSIS: LazyLock<Regex> = re!(r"analysis|technical|fundamental|chart|indicator");

static RE_SENTIMENT: LazyLock<Regex> = re!(r"sentiment|bullish|bearish|neutral|market mood");
static RE_RISK: LazyLock<Regex> = re!(r"risk|drawdown|volatility|exposure|diversification|danger");
static RE_WHALE: LazyLock<Regex> = re!(r"whale|accumulation|exchange flow|large transfer");
static RE_SEARCH: LazyLock<Regex> = re!(r"search|find|list|show|\btop\b|gainer|loser|trending|best|worst");
static RE_PREDICTION: LazyLock<Regex> = re!(r"predict|target|forecast|price|next|24h|tomorrow|week");

const EMPTY_PROMPT: &str = "Please ask me anything about cryptocurrency markets, trading, or specific coins!";

const BLOCKCHAIN: &str = "🔗 Blockchain is a distributed ledger technology that records transactions across multiple computers. Each block contains transaction data, a timestamp, and a cryptographic hash of the previous block, creating an immutable chain. This decentralized structure ensures transparency, security, and eliminates the need for intermediaries.";
const MINING: &str = "⛏️ Crypto mining is the process of validating transactions and adding them to the blockchain using computational power. Miners solve complex mathematical puzzles (Proof of Work) to create new blocks and are rewarded with newly minted coins and transaction fees. Popular mining coins include Bitcoin, Litecoin, and Monero.";
const STAKING: &str = "🏦 Staking is the process of locking up cryptocurrency to support blockchain operations in Proof of Stake (PoS) networks. By staking, you help validate transactions and secure the network, earning rewards (typically 4-20% APY). Unlike mining, staking is energy-efficient and doesn't require specialized hardware.";
const WALLETS: &str = "👛 Crypto wallets store your private keys that give you access to your cryptocurrency. Types: \n• Hot Wallets: Connected to internet (MetaMask, Trust Wallet) - convenient but less secure\n• Cold Wallets: Offline storage (Ledger, Trezor) - most secure for large holdings\n• Paper Wallets: Physical printout of keys\nNever share your private keys or seed phrase!";
const DEFI: &str = "💱 DeFi (Decentralized Finance) recreates traditional financial services without banks or intermediaries. Key features:\n• Lending/Borrowing platforms (Aave, Compound)\n• Decentralized Exchanges (Uniswap, PancakeSwap)\n• Yield Farming: Earning rewards by providing liquidity\n• Smart contracts automate everything\nHigher returns but also higher risk!";
const NFTS: &str = "🎨 NFTs (Non-Fungible Tokens) are unique digital assets on the blockchain representing ownership of items like art, music, videos, or virtual real estate. Unlike cryptocurrencies, each NFT is unique and can't be exchanged 1:1. Popular marketplaces: OpenSea, Rarible, Magic Eden.";
const HOW_TO_TRADE: &str = "💳 How to buy crypto:\n1. Choose an exchange (Coinbase, Binance, Kraken)\n2. Create account & complete KYC verification\n3. Deposit funds (bank transfer, card, etc.)\n4. Place buy order (market or limit)\n5. Store in exchange or transfer to personal wallet\n\nFor selling: Reverse the process. Always consider fees and tax implications!";
const WHY_VOLATILE: &str = "📊 Crypto is volatile because:\n• Small market size compared to traditional assets\n• 24/7 trading with no circuit breakers\n• Unregulated markets prone to manipulation\n• Speculative nature and FOMO/FUD cycles\n• News and social media heavily influence sentiment\n• Whale movements can cause rapid price swings\n\nVolatility creates both opportunities and risks!";
const WHEN_TO_BUY: &str = "⏰ Best time to buy:\n• Dollar-Cost Averaging (DCA): Invest fixed amount regularly regardless of price\n• Buy the dip: Purchase during market corrections\n• After FUD (Fear, Uncertainty, Doubt) subsides\n• When fundamentals are strong but price is down\n• NEVER invest more than you can afford to lose\n• Avoid FOMO buying at all-time highs\n\nTime in market > Timing the market!";
const SHOULD_I: &str = "🤔 Investment decision factors:\n• Only invest what you can afford to lose\n• Research thoroughly (whitepaper, team, use case)\n• Diversify your portfolio\n• Consider risk tolerance and timeline\n• Understand the technology and market\n• Be aware of scams and red flags\n\nI can't give financial advice, but always DYOR (Do Your Own Research)!";
const SECURITY: &str = "🔒 Crypto security best practices:\n• Use hardware wallets for large holdings\n• Enable 2FA on all accounts\n• Never share private keys or seed phrases\n• Beware of phishing websites and emails\n• Verify smart contracts before interacting\n• Use unique strong passwords\n• Keep software updated\n• Be skeptical of 'guaranteed returns'\n• Double-check wallet addresses before sending";
const TAX: &str = "💰 Crypto tax basics:\n• Most countries treat crypto as property\n• Taxable events: selling, trading, spending crypto\n• Capital gains/losses calculated: Sale Price - Purchase Price\n• Keep detailed records of all transactions\n• Mining/staking rewards are taxable income\n• Holding isn't taxable (only when you dispose)\n• Consult a tax professional for your jurisdiction";
const STRATEGY: &str = "📈 Popular crypto strategies:\n• HODLing: Long-term hold through volatility\n• DCA: Regular fixed investments\n• Swing Trading: Trade medium-term trends\n• Day Trading: Short-term active trading (high risk)\n• Staking/Yield Farming: Passive income\n• Diversification: Don't put all eggs in one basket\n• Set stop-losses to limit downside\n• Take profits gradually on the way up";
const ANALYSIS: &str = "📊 Crypto analysis types:\n• Technical Analysis: Charts, patterns, indicators (RSI, MACD, moving averages)\n• Fundamental Analysis: Technology, team, adoption, tokenomics\n• On-chain Analysis: Wallet activity, exchange flows, network metrics\n• Sentiment Analysis: Social media, news, fear/greed index\n\nCombine multiple approaches for better decisions!";

const GREETING: [&str; 6] = [
    "👋 Hello! I'm your crypto AI assistant. I can help you with:",
    "• Market analysis and coin data",
    "• Trading strategies and risk assessment",
    "• Crypto concepts and education",
    "• Price predictions and sentiment",
    "Ask me anything about cryptocurrency!",
];

const WHALES: [&str; 6] = [
    "🐋 Whale Activity Monitoring:",
    "• Large transfers can signal accumulation or distribution",
    "• Exchange inflows often precede selling pressure",
    "• Exchange outflows suggest long-term holding",
    "• Sudden volume spikes indicate whale movements",
    "⚠️ High volatility risk during whale activity!",
];

const CAPABILITIES: [&str; 15] = [
    "💡 I'm your crypto AI assistant! I can help with:",
    "\n📚 Education:",
    "• What is blockchain/mining/staking/DeFi/NFTs?",
    "• How to buy/sell crypto safely?",
    "• Security & wallet best practices",
    "\n📊 Market Analysis:",
    "• Current market sentiment & risks",
    "• Top gainers and losers",
    "• Price predictions & forecasts",
    "• Specific coin analysis (mention: btc, eth, etc.)",
    "\n💼 Trading & Strategy:",
    "• Investment strategies",
    "• Risk management",
    "• Tax implications",
    "\nAsk me anything specific!",
];

/// Answer a free-text question against the current snapshot
pub fn respond(query: &str, assets: &[AssetRecord]) -> String {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return EMPTY_PROMPT.into();
    }

    if RE_GREETING.is_match(&q) {
        return GREETING.join("\n");
    }

    if let Some(coin) = mentioned_coin(&q, assets) {
        return coin_card(coin, RE_PREDICTION.is_match(&q));
    }

    if let Some(answer) = explainer(&q) {
        return answer.into();
    }

    if !assets.is_empty() {
        if let Some(answer) = market_answer(&q, assets, &analyze_market(assets)) {
            return answer;
        }
    }

    CAPABILITIES.join("\n")
}

/// First snapshot coin whose symbol appears as a word, or whose name appears anywhere
fn mentioned_coin<'a>(q: &str, assets: &'a [AssetRecord]) -> Option<&'a AssetRecord> {
    let words: Vec<&str> = q.split(|c: char| !c.is_ascii_alphanumeric()).collect();
    assets.iter().find(|coin| {
        words.contains(&coin.symbol.as_str()) || q.contains(&coin.name.to_lowercase())
    })
}

fn price_dp(price: Decimal) -> u32 {
    if price < Decimal::ONE { 4 } else { 2 }
}

fn signed(value: Decimal) -> String {
    let sign = if value > Decimal::ZERO { "+" } else { "" };
    format!("{sign}{}", fixed(value, 2))
}

fn coin_card(coin: &AssetRecord, with_forecast: bool) -> String {
    let dp = price_dp(coin.price);
    let volume = coin
        .volume
        .map_or_else(|| "N/A".to_string(), |v| format!("${}B", fixed(v / dec!(1_000_000_000), 2)));

    let mut lines = vec![
        format!("📊 {} ({}):", coin.name, coin.symbol.to_uppercase()),
        format!("💰 Price: ${}", fixed(coin.price, dp)),
        format!("📈 24h Change: {}%", signed(coin.change_24h)),
        format!("📊 Volume: {volume}"),
    ];

    if with_forecast {
        let trend = if coin.change_24h > Decimal::ZERO { dec!(1.02) } else { dec!(0.98) };
        let (low, high) = forecast_range(coin.price, trend);
        lines.push(format!("🔮 24h Forecast: ${low} - ${high}"));
    }
    lines.join("\n")
}

fn forecast_range(price: Decimal, trend: Decimal) -> (String, String) {
    let dp = price_dp(price);
    (
        fixed(price * dec!(0.97) * trend, dp),
        fixed(price * dec!(1.03) * trend, dp),
    )
}

fn explainer(q: &str) -> Option<&'static str> {
    let what = RE_WHAT.is_match(q);
    let answer = if what && RE_BLOCKCHAIN.is_match(q) {
        BLOCKCHAIN
    } else if what && RE_MINING.is_match(q) {
        MINING
    } else if what && RE_STAKING.is_match(q) {
        STAKING
    } else if what && RE_WALLET.is_match(q) {
        WALLETS
    } else if what && RE_DEFI.is_match(q) {
        DEFI
    } else if what && RE_NFT.is_match(q) {
        NFTS
    } else if RE_HOW.is_match(q) && RE_TRADE.is_match(q) {
        HOW_TO_TRADE
    } else if RE_WHY.is_match(q) && RE_VOLATILE.is_match(q) {
        WHY_VOLATILE
    } else if RE_WHEN.is_match(q) && RE_BUY_OR_INVEST.is_match(q) {
        WHEN_TO_BUY
    } else if RE_SHOULD.is_match(q) {
        SHOULD_I
    } else if RE_SECURITY.is_match(q) {
        SECURITY
    } else if RE_TAX.is_match(q) {
        TAX
    } else if RE_STRATEGY.is_match(q) {
        STRATEGY
    } else if RE_ANALYSIS.is_match(q) {
        ANALYSIS
    } else {
        return None;
    };
    Some(answer)
}

fn recommendation(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Bullish => "Momentum favors buyers. Scale in gradually and keep stop-losses in place.",
        Sentiment::Bearish => "Stay defensive. Favor majors and keep dry powder for lower levels.",
        Sentiment::Neutral => "Wait for a clearer trend. Dollar-cost averaging keeps entries disciplined.",
    }
}

fn market_answer(q: &str, assets: &[AssetRecord], report: &MarketReport) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();

    if RE_SENTIMENT.is_match(q) {
        let sentiment = report.sentiment();
        lines.push(format!(
            "📊 Overall Market Sentiment: {}",
            sentiment.as_str().to_uppercase()
        ));
        lines.push(format!("📰 Key Narrative: {}", report.summary));
        lines.push(format!("💡 Recommendation: {}", recommendation(sentiment)));
    } else if RE_RISK.is_match(q) {
        lines.push("⚠️ Current Risk Factors:".into());
        if report.risks.is_empty() {
            lines.push("• No major risk flags detected.".into());
        }
        lines.extend(report.risks.iter().map(|r| format!("• {}", r.description)));
        lines.push("\n💡 Always diversify and use stop-losses to manage risk.".into());
    } else if RE_WHALE.is_match(q) {
        lines.extend(WHALES.iter().map(ToString::to_string));
    } else if RE_SEARCH.is_match(q) {
        let mut sorted: Vec<&AssetRecord> = assets.iter().collect();
        sorted.sort_by(|a, b| b.change_24h.cmp(&a.change_24h));

        lines.push("🚀 Top 5 Gainers:".into());
        lines.extend(sorted.iter().take(5).map(|c| mover_line(c)));
        lines.push("\n📉 Top 5 Losers:".into());
        lines.extend(sorted.iter().rev().take(5).map(|c| mover_line(c)));
    } else if RE_PREDICTION.is_match(q) {
        lines.push("🔮 24h Market Predictions:".into());
        for coin in assets.iter().take(5) {
            let trend = if coin.change_24h > dec!(5) {
                dec!(1.02)
            } else if coin.change_24h < dec!(-5) {
                dec!(0.98)
            } else {
                Decimal::ONE
            };
            let (low, high) = forecast_range(coin.price, trend);
            let confidence = round_half_up((coin.volatility() / dec!(20) + dec!(0.6)) * dec!(100), 0);
            lines.push(format!("{}: ${low} - ${high} ({confidence}% confidence)", coin.name));
        }
        lines.push("\n⚠️ Predictions are estimates based on current trends, not financial advice!".into());
    } else {
        return None;
    }

    Some(lines.join("\n"))
}

fn mover_line(coin: &AssetRecord) -> String {
    format!(
        "  {} ({}): {}%",
        coin.name,
        coin.symbol.to_uppercase(),
        signed(coin.change_24h)
    )
}
